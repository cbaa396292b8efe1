pub mod types;
pub mod sanitize;
pub mod prompt;
pub mod ollama;
pub mod invoker;
pub mod parser;

pub use types::*;
pub use sanitize::*;
pub use prompt::*;
pub use ollama::*;
pub use invoker::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("AI analysis timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("AI service is not reachable at {0}")]
    Connection(String),

    #[error("AI service returned error (status {status}): {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}
