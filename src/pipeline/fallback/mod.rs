//! Deterministic, offline analysis used whenever the AI path fails.
//!
//! Never calls an external service and always returns a complete
//! [`AnalysisResult`].

pub mod identifiers;
pub mod lab_values;
pub mod narrative;

pub use identifiers::*;
pub use lab_values::*;
pub use narrative::*;

use crate::models::{AbnormalValue, AnalysisOutcome, AnalysisResult, Severity};

/// Which pipeline stage sent the request to the fallback analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTrigger {
    Extraction,
    Invocation,
    Parsing,
}

impl FallbackTrigger {
    pub fn outcome(self) -> AnalysisOutcome {
        match self {
            FallbackTrigger::Extraction => AnalysisOutcome::ExtractFailedFallback,
            FallbackTrigger::Invocation => AnalysisOutcome::InvokeFailedFallback,
            FallbackTrigger::Parsing => AnalysisOutcome::ParseFailedFallback,
        }
    }

    /// Stage name used in log fields.
    pub fn stage(self) -> &'static str {
        match self {
            FallbackTrigger::Extraction => "extraction",
            FallbackTrigger::Invocation => "invocation",
            FallbackTrigger::Parsing => "parsing",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackAnalyzer;

impl FallbackAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build a result straight from the report text. `text` may be empty.
    pub fn analyze(&self, text: &str, trigger: FallbackTrigger) -> (AnalysisResult, AnalysisOutcome) {
        let result = if text.trim().is_empty() {
            unreadable_result()
        } else {
            readable_result(text)
        };

        tracing::debug!(
            stage = trigger.stage(),
            abnormal_count = result.abnormal_values.len(),
            "Fallback analysis built"
        );
        (result, trigger.outcome())
    }
}

fn readable_result(text: &str) -> AnalysisResult {
    let abnormal_values = find_abnormal_values(text);
    let narrative = &READABLE_NARRATIVE;

    let mut detected_conditions = to_owned_list(narrative.detected_conditions);
    detected_conditions.extend(abnormal_values.iter().map(describe_flag));

    AnalysisResult {
        patient_details: extract_patient_details(text),
        summary: readable_summary(abnormal_values.len()),
        simple_explanation: narrative.simple_explanation.to_string(),
        detected_conditions,
        possible_causes: to_owned_list(narrative.possible_causes),
        symptoms: to_owned_list(narrative.symptoms),
        lifestyle_recommendations: to_owned_list(narrative.lifestyle_recommendations),
        medication_guidance: to_owned_list(narrative.medication_guidance),
        clinician_guidance: to_owned_list(narrative.clinician_guidance),
        abnormal_values,
    }
}

fn unreadable_result() -> AnalysisResult {
    let narrative = &UNREADABLE_NARRATIVE;
    AnalysisResult {
        patient_details: Default::default(),
        summary: UNREADABLE_SUMMARY.to_string(),
        simple_explanation: narrative.simple_explanation.to_string(),
        abnormal_values: vec![],
        detected_conditions: to_owned_list(narrative.detected_conditions),
        possible_causes: to_owned_list(narrative.possible_causes),
        symptoms: to_owned_list(narrative.symptoms),
        lifestyle_recommendations: to_owned_list(narrative.lifestyle_recommendations),
        medication_guidance: to_owned_list(narrative.medication_guidance),
        clinician_guidance: to_owned_list(narrative.clinician_guidance),
    }
}

/// Restates a flag in words without naming a condition.
fn describe_flag(value: &AbnormalValue) -> String {
    let position = match value.severity {
        Severity::Low => "below",
        Severity::High => "above",
        Severity::Critical => "well outside",
    };
    format!(
        "{} is {position} its reference range; ask your doctor what this means for you",
        value.parameter
    )
}
