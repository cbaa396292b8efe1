use super::AnalysisError;

/// Remote text-generation service abstraction (allows mocking).
///
/// Calls are blocking; the invoker moves them onto the blocking pool and
/// enforces the deadline there.
pub trait LlmClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, AnalysisError>;

    fn list_models(&self) -> Result<Vec<String>, AnalysisError>;
}
