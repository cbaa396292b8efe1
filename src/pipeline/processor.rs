//! Report analysis orchestrator.
//!
//! Single entry point that drives one uploaded report through the pipeline:
//! extract → prompt → invoke → parse, switching to the offline fallback
//! analyzer whenever a stage fails. All collaborators are injected so the
//! orchestrator is testable with mock clients.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::models::{AnalysisOutcome, AnalysisReport, AnalysisResult, PatientContext};
use crate::pipeline::analysis::{
    build_analysis_prompt, parse_analysis_response, AnalysisInvoker, LlmClient,
};
use crate::pipeline::extraction::{DocumentTextExtractor, ExtractedText, ExtractionError};
use crate::pipeline::fallback::{FallbackAnalyzer, FallbackTrigger};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The only failures a caller ever sees. Everything else ends in a result.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Document is not a PDF")]
    InvalidDocumentFormat,

    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where one request is in the pipeline. `Completed` is the only exit.
enum PipelineState {
    Extracting,
    Analyzing {
        text: ExtractedText,
    },
    Parsing {
        text: ExtractedText,
        reply: String,
    },
    Fallback {
        text: ExtractedText,
        trigger: FallbackTrigger,
        reason: String,
    },
    Completed {
        result: AnalysisResult,
        outcome: AnalysisOutcome,
        fallback_reason: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Turns report bytes plus the request form into an [`AnalysisReport`].
///
/// Immutable after construction; share it behind an `Arc` across tasks.
pub struct ReportProcessor {
    extractor: Arc<DocumentTextExtractor>,
    invoker: AnalysisInvoker,
    fallback: FallbackAnalyzer,
}

impl ReportProcessor {
    pub fn new(
        extractor: DocumentTextExtractor,
        invoker: AnalysisInvoker,
        fallback: FallbackAnalyzer,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            invoker,
            fallback,
        }
    }

    /// Default extractor and fallback, with the model and deadline from `config`.
    pub fn from_config(config: &AnalyzerConfig, llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        let invoker =
            AnalysisInvoker::new(llm, &config.model).with_deadline(config.analysis_timeout);
        Self::new(
            DocumentTextExtractor::default(),
            invoker,
            FallbackAnalyzer::new(),
        )
    }

    /// Analyze one report.
    ///
    /// Returns `Err` only for bytes that are not a PDF (checked before the
    /// pipeline starts) or a crash inside the PDF library. Every other
    /// failure is absorbed by the fallback analyzer.
    pub async fn analyze(
        &self,
        bytes: &[u8],
        context: &PatientContext,
    ) -> Result<AnalysisReport, ProcessingError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("analyze_report", %request_id, bytes = bytes.len());

        self.run(request_id, bytes, context).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        bytes: &[u8],
        context: &PatientContext,
    ) -> Result<AnalysisReport, ProcessingError> {
        let started = Instant::now();

        self.extractor
            .verify_format(bytes)
            .map_err(|_| ProcessingError::InvalidDocumentFormat)?;

        let mut state = PipelineState::Extracting;
        loop {
            state = match state {
                PipelineState::Extracting => self.extract(bytes).await?,

                PipelineState::Analyzing { text } => {
                    let prompt = build_analysis_prompt(text.as_str(), context);
                    match self.invoker.invoke(prompt).await {
                        Ok(reply) => PipelineState::Parsing { text, reply },
                        Err(e) => PipelineState::Fallback {
                            text,
                            trigger: FallbackTrigger::Invocation,
                            reason: e.to_string(),
                        },
                    }
                }

                PipelineState::Parsing { text, reply } => match parse_analysis_response(&reply) {
                    Ok(result) => PipelineState::Completed {
                        result,
                        outcome: AnalysisOutcome::AiSucceeded,
                        fallback_reason: None,
                    },
                    Err(e) => PipelineState::Fallback {
                        text,
                        trigger: FallbackTrigger::Parsing,
                        reason: e.to_string(),
                    },
                },

                PipelineState::Fallback {
                    text,
                    trigger,
                    reason,
                } => {
                    tracing::warn!(stage = trigger.stage(), %reason, "Switching to fallback analysis");
                    let (result, outcome) = self.fallback.analyze(text.as_str(), trigger);
                    PipelineState::Completed {
                        result,
                        outcome,
                        fallback_reason: Some(reason),
                    }
                }

                PipelineState::Completed {
                    result,
                    outcome,
                    fallback_reason,
                } => {
                    tracing::info!(
                        outcome = %outcome,
                        fallback = outcome.used_fallback(),
                        abnormal_count = result.abnormal_values.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Report analysis completed"
                    );
                    return Ok(AnalysisReport {
                        request_id,
                        outcome,
                        fallback_reason,
                        completed_at: Utc::now(),
                        result,
                    });
                }
            };
        }
    }

    /// One extraction attempt. Only a library crash escapes the pipeline.
    ///
    /// PDF parsing is CPU-bound, so it runs on the blocking pool.
    async fn extract(&self, bytes: &[u8]) -> Result<PipelineState, ProcessingError> {
        let extractor = Arc::clone(&self.extractor);
        let owned = bytes.to_vec();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Extraction task failed");
                ProcessingError::AnalysisUnavailable(format!("extraction task failed: {e}"))
            })?;

        match extracted {
            Ok(text) => {
                tracing::debug!(text_len = text.len(), "Text extracted");
                Ok(PipelineState::Analyzing { text })
            }
            Err(e) if e.is_recoverable() => Ok(PipelineState::Fallback {
                text: ExtractedText::default(),
                trigger: FallbackTrigger::Extraction,
                reason: e.to_string(),
            }),
            Err(ExtractionError::InvalidDocumentFormat) => Err(ProcessingError::InvalidDocumentFormat),
            Err(e) => {
                tracing::error!(error = %e, "PDF extraction crashed");
                Err(ProcessingError::AnalysisUnavailable(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread::ThreadId;
    use std::time::Duration;

    use crate::models::{Gender, PatientDetails, Severity};
    use crate::pipeline::analysis::MockLlmClient;
    use crate::pipeline::extraction::pdf::test_pdf::make_pdf;
    use crate::pipeline::extraction::PdfExtractor;

    const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n%%EOF";

    const REPORT_TEXT: &str = "Patient Name: Meera Iyer\n\
        Age: 45 Years\n\
        Sex: Female\n\
        Glucose (Fasting): 140 mg/dL\n\
        Hemoglobin: 13.1 g/dL";

    const AI_REPLY: &str = r#"{
        "patientDetails": {"name": "Meera Iyer", "age": "45", "gender": "Female", "phoneNumber": "Not specified"},
        "summary": "Fasting glucose is above range.",
        "simpleExplanation": "Your sugar level is a bit high.",
        "abnormalValues": [{"parameter": "Glucose", "value": "140 mg/dL", "normalRange": "70-100 mg/dL", "severity": "high"}],
        "detectedConditions": [],
        "possibleCauses": ["Diet"],
        "symptoms": [],
        "lifestyleRecommendations": ["Walk daily"],
        "medicationGuidance": [],
        "clinicianGuidance": ["Discuss an HbA1c test"]
    }"#;

    struct FixedPdf(&'static str);

    impl PdfExtractor for FixedPdf {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Ok(vec![self.0.to_string()])
        }
    }

    struct BrokenPdf;

    impl PdfExtractor for BrokenPdf {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::PdfParsing("xref table missing".into()))
        }
    }

    struct PanickingPdf;

    impl PdfExtractor for PanickingPdf {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            panic!("stack overflow in font parser");
        }
    }

    /// Records which thread ran the extraction.
    struct ThreadRecordingPdf(Arc<Mutex<Option<ThreadId>>>);

    impl PdfExtractor for ThreadRecordingPdf {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            *self.0.lock().unwrap() = Some(std::thread::current().id());
            Ok(vec![REPORT_TEXT.to_string()])
        }
    }

    fn context() -> PatientContext {
        PatientContext {
            name: "Form Name".into(),
            age: 45,
            gender: Gender::Female,
            phone_number: "0000000000".into(),
        }
    }

    fn processor(pdf: impl PdfExtractor + Send + Sync + 'static, llm: MockLlmClient) -> ReportProcessor {
        ReportProcessor::new(
            DocumentTextExtractor::new(Box::new(pdf)),
            AnalysisInvoker::new(Arc::new(llm), "test-model"),
            FallbackAnalyzer::new(),
        )
    }

    #[tokio::test]
    async fn ai_path_succeeds() {
        let processor = processor(FixedPdf(REPORT_TEXT), MockLlmClient::new(AI_REPLY));
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();

        assert_eq!(report.outcome, AnalysisOutcome::AiSucceeded);
        assert!(report.fallback_reason.is_none());
        assert_eq!(report.result.summary, "Fasting glucose is above range.");
        assert_eq!(report.result.abnormal_values[0].severity, Severity::High);
        assert_eq!(report.request_id.get_version_num(), 4);
    }

    #[tokio::test]
    async fn non_json_reply_completes_via_fallback() {
        let processor = processor(
            FixedPdf(REPORT_TEXT),
            MockLlmClient::new("I am unable to analyze this document."),
        );
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();

        assert_eq!(report.outcome, AnalysisOutcome::ParseFailedFallback);
        assert!(report.fallback_reason.unwrap().contains("Malformed"));
        assert_eq!(report.result.patient_details.name, "Meera Iyer");
        assert_eq!(report.result.abnormal_values.len(), 1);
        assert_eq!(report.result.abnormal_values[0].value, "140 mg/dL");
    }

    #[tokio::test]
    async fn slow_service_completes_via_fallback_within_deadline() {
        let slow = MockLlmClient::new(AI_REPLY).with_delay(Duration::from_millis(800));
        let processor = ReportProcessor::new(
            DocumentTextExtractor::new(Box::new(FixedPdf(REPORT_TEXT))),
            AnalysisInvoker::new(Arc::new(slow), "test-model")
                .with_deadline(Duration::from_millis(50)),
            FallbackAnalyzer::new(),
        );

        let started = Instant::now();
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(700));
        assert_eq!(report.outcome, AnalysisOutcome::InvokeFailedFallback);
        assert!(report.fallback_reason.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn service_error_completes_via_fallback() {
        let processor = processor(FixedPdf(REPORT_TEXT), MockLlmClient::failing(503, "busy"));
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();
        assert_eq!(report.outcome, AnalysisOutcome::InvokeFailedFallback);
        assert_eq!(report.result.patient_details.age, "45");
    }

    #[tokio::test]
    async fn empty_bytes_are_rejected_before_pipeline() {
        let processor = processor(FixedPdf(REPORT_TEXT), MockLlmClient::new(AI_REPLY));
        let err = processor.analyze(b"", &context()).await.unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidDocumentFormat));
    }

    #[tokio::test]
    async fn textless_pdf_gets_unreadable_fallback() {
        let processor = ReportProcessor::new(
            DocumentTextExtractor::default(),
            AnalysisInvoker::new(Arc::new(MockLlmClient::new(AI_REPLY)), "test-model"),
            FallbackAnalyzer::new(),
        );
        let report = processor.analyze(&make_pdf(&[]), &context()).await.unwrap();

        assert_eq!(report.outcome, AnalysisOutcome::ExtractFailedFallback);
        assert!(report.result.summary.contains("could not be read"));
        assert_eq!(report.result.patient_details, PatientDetails::default());
        assert!(report.result.abnormal_values.is_empty());
    }

    #[tokio::test]
    async fn unparsable_pdf_gets_unreadable_fallback() {
        let processor = processor(BrokenPdf, MockLlmClient::new(AI_REPLY));
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();
        assert_eq!(report.outcome, AnalysisOutcome::ExtractFailedFallback);
        assert!(report.fallback_reason.unwrap().contains("xref"));
    }

    #[tokio::test]
    async fn library_crash_is_analysis_unavailable() {
        let processor = processor(PanickingPdf, MockLlmClient::new(AI_REPLY));
        let err = processor.analyze(MINIMAL_PDF, &context()).await.unwrap_err();
        assert!(matches!(err, ProcessingError::AnalysisUnavailable(_)));
    }

    #[tokio::test]
    async fn extraction_runs_off_the_async_worker() {
        let seen = Arc::new(Mutex::new(None));
        let processor = processor(
            ThreadRecordingPdf(Arc::clone(&seen)),
            MockLlmClient::new(AI_REPLY),
        );
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();

        assert_eq!(report.outcome, AnalysisOutcome::AiSucceeded);
        let recorded = *seen.lock().unwrap();
        let extraction_thread = recorded.expect("extractor was not called");
        assert_ne!(extraction_thread, std::thread::current().id());
    }

    #[tokio::test]
    async fn form_identifiers_never_override_report() {
        let processor = processor(FixedPdf("Glucose: 60 mg/dL"), MockLlmClient::new("nope"));
        let report = processor.analyze(MINIMAL_PDF, &context()).await.unwrap();
        assert_eq!(report.result.patient_details.name, "Not specified");
        assert_eq!(report.result.patient_details.phone_number, "Not specified");
    }

    #[test]
    fn processor_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReportProcessor>();
    }

    #[test]
    fn from_config_uses_configured_model_and_deadline() {
        let config = AnalyzerConfig {
            model: "llama3.1:8b".into(),
            analysis_timeout: Duration::from_secs(30),
            ..AnalyzerConfig::default()
        };
        let processor = ReportProcessor::from_config(&config, Arc::new(MockLlmClient::new("")));
        assert_eq!(processor.invoker.model(), "llama3.1:8b");
        assert_eq!(processor.invoker.deadline(), Duration::from_secs(30));
    }
}
