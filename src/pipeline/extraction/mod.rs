pub mod types;
pub mod sanitize;
pub mod pdf;
pub mod extractor;

pub use types::*;
pub use sanitize::*;
pub use pdf::*;
pub use extractor::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document is not a PDF (missing %PDF- signature)")]
    InvalidDocumentFormat,

    #[error("Document contains no readable text")]
    EmptyDocumentContent,

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF extraction library crashed: {0}")]
    LibraryPanic(String),
}

impl ExtractionError {
    /// Errors the pipeline recovers from by switching to the fallback analyzer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractionError::EmptyDocumentContent | ExtractionError::PdfParsing(_)
        )
    }
}
