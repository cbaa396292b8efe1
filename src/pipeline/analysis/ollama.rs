use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::AnalysisError;

/// Ollama HTTP client for report analysis.
///
/// Which model to run is configuration; the client never looks one up.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client pointing at an Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_connect() {
            AnalysisError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            AnalysisError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            AnalysisError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    /// Ask Ollama to constrain decoding to JSON.
    format: &'a str,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(AnalysisError::ServiceStatus {
        status: status.as_u16(),
        body,
    })
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: OllamaGenerateResponse = check_status(response)?
            .json()
            .map_err(|e| AnalysisError::HttpClient(format!("unreadable response body: {e}")))?;

        Ok(parsed.response)
    }

    fn list_models(&self) -> Result<Vec<String>, AnalysisError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: OllamaTagsResponse = check_status(response)?
            .json()
            .map_err(|e| AnalysisError::HttpClient(format!("unreadable response body: {e}")))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Mock LLM client for testing. Returns a configurable reply or error, or
/// blocks for a while before answering.
pub struct MockLlmClient {
    reply: MockReply,
    delay: Option<Duration>,
    available_models: Vec<String>,
}

enum MockReply {
    Text(String),
    Status(u16, String),
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            reply: MockReply::Text(response.to_string()),
            delay: None,
            available_models: vec!["medgemma:4b".to_string()],
        }
    }

    /// A client whose every call fails with the given HTTP status.
    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            reply: MockReply::Status(status, body.to_string()),
            delay: None,
            available_models: vec![],
        }
    }

    /// Sleep this long inside `generate` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str, _system: &str) -> Result<String, AnalysisError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Status(status, body) => Err(AnalysisError::ServiceStatus {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    fn list_models(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self.available_models.clone())
    }
}
