use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_ANALYSIS_TIMEOUT_SECS;

use super::prompt::ANALYSIS_SYSTEM_PROMPT;
use super::types::LlmClient;
use super::AnalysisError;

/// Deadline for one analysis call.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS);

/// Sends a prompt to the generation service under a hard deadline.
///
/// The blocking client call runs on tokio's blocking pool and is raced
/// against a timer. When the timer wins the call is abandoned, not killed:
/// its thread finishes on its own and the reply is discarded. No retries.
pub struct AnalysisInvoker {
    llm: Arc<dyn LlmClient + Send + Sync>,
    model: String,
    deadline: Duration,
}

impl AnalysisInvoker {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
            deadline: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn invoke(&self, prompt: String) -> Result<String, AnalysisError> {
        let llm = Arc::clone(&self.llm);
        let model = self.model.clone();
        let call =
            tokio::task::spawn_blocking(move || llm.generate(&model, &prompt, ANALYSIS_SYSTEM_PROMPT));

        match tokio::time::timeout(self.deadline, call).await {
            Err(_elapsed) => {
                tracing::warn!(
                    model = %self.model,
                    deadline_secs = self.deadline.as_secs(),
                    "Analysis call exceeded deadline, abandoning it"
                );
                Err(AnalysisError::Timeout {
                    secs: self.deadline.as_secs(),
                })
            }
            Ok(Err(join_error)) => Err(AnalysisError::HttpClient(format!(
                "analysis call aborted: {join_error}"
            ))),
            Ok(Ok(reply)) => reply,
        }
    }
}
