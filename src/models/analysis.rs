use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AnalysisOutcome, Severity};

/// Placeholder used for any identifier that could not be determined.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Identifiers as read from the report. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetails {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub phone_number: String,
}

impl Default for PatientDetails {
    fn default() -> Self {
        Self {
            name: NOT_SPECIFIED.into(),
            age: NOT_SPECIFIED.into(),
            gender: NOT_SPECIFIED.into(),
            phone_number: NOT_SPECIFIED.into(),
        }
    }
}

/// A lab measurement flagged outside its reference range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbnormalValue {
    pub parameter: String,
    /// Value as printed, including its unit when one was found.
    pub value: String,
    pub normal_range: String,
    pub severity: Severity,
}

/// The patient-facing analysis of one report.
///
/// Built exactly once per request, by either the AI path or the fallback
/// path, and never mutated afterwards. Array fields are plain `Vec`s so they
/// always serialize as arrays, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub patient_details: PatientDetails,
    pub summary: String,
    pub simple_explanation: String,
    pub abnormal_values: Vec<AbnormalValue>,
    pub detected_conditions: Vec<String>,
    pub possible_causes: Vec<String>,
    pub symptoms: Vec<String>,
    pub lifestyle_recommendations: Vec<String>,
    pub medication_guidance: Vec<String>,
    pub clinician_guidance: Vec<String>,
}

/// Envelope returned by the pipeline: the result plus how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub outcome: AnalysisOutcome,
    /// Why the fallback path ran, if it did. Never shown to the patient as an error.
    pub fallback_reason: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_result() -> AnalysisResult {
        AnalysisResult {
            patient_details: PatientDetails::default(),
            summary: String::new(),
            simple_explanation: String::new(),
            abnormal_values: vec![],
            detected_conditions: vec![],
            possible_causes: vec![],
            symptoms: vec![],
            lifestyle_recommendations: vec![],
            medication_guidance: vec![],
            clinician_guidance: vec![],
        }
    }

    #[test]
    fn patient_details_default_to_placeholder() {
        let details = PatientDetails::default();
        assert_eq!(details.name, NOT_SPECIFIED);
        assert_eq!(details.age, NOT_SPECIFIED);
        assert_eq!(details.gender, NOT_SPECIFIED);
        assert_eq!(details.phone_number, NOT_SPECIFIED);
    }

    #[test]
    fn empty_arrays_serialize_as_arrays() {
        let value = serde_json::to_value(empty_result()).unwrap();
        for field in [
            "abnormalValues",
            "detectedConditions",
            "possibleCauses",
            "symptoms",
            "lifestyleRecommendations",
            "medicationGuidance",
            "clinicianGuidance",
        ] {
            assert!(value[field].is_array(), "{field} should be an array");
        }
        assert_eq!(value["patientDetails"]["phoneNumber"], NOT_SPECIFIED);
    }

    #[test]
    fn abnormal_value_wire_shape() {
        let value = AbnormalValue {
            parameter: "Glucose".into(),
            value: "140 mg/dL".into(),
            normal_range: "70-126 mg/dL".into(),
            severity: Severity::High,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["normalRange"], "70-126 mg/dL");
        assert_eq!(json["severity"], "high");
    }
}
