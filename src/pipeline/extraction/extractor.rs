use std::panic::{catch_unwind, AssertUnwindSafe};

use super::pdf::{has_pdf_signature, PdfTextExtractor};
use super::sanitize::sanitize_extracted_text;
use super::types::{ExtractedText, PdfExtractor};
use super::ExtractionError;

/// Bytes → plain text for one uploaded report.
///
/// Makes a single extraction attempt. The PDF library is the only piece of
/// the pipeline that can fail in a way we do not recover from, so its panics
/// are caught here and reported as [`ExtractionError::LibraryPanic`].
/// Pages are joined with a blank line before cleaning.
const PAGE_SEPARATOR: &str = "\n\n";

pub struct DocumentTextExtractor {
    pdf: Box<dyn PdfExtractor + Send + Sync>,
}

impl DocumentTextExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor + Send + Sync>) -> Self {
        Self { pdf }
    }

    /// Check the PDF signature without touching the library.
    pub fn verify_format(&self, bytes: &[u8]) -> Result<(), ExtractionError> {
        if has_pdf_signature(bytes) {
            Ok(())
        } else {
            Err(ExtractionError::InvalidDocumentFormat)
        }
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        self.verify_format(bytes)?;

        let pages = catch_unwind(AssertUnwindSafe(|| self.pdf.extract_text(bytes)))
            .map_err(|payload| ExtractionError::LibraryPanic(panic_message(payload.as_ref())))??;

        let raw = pages.join(PAGE_SEPARATOR);
        let text = ExtractedText::new(sanitize_extracted_text(&raw));
        if text.is_blank() {
            return Err(ExtractionError::EmptyDocumentContent);
        }

        tracing::debug!(
            page_count = pages.len(),
            raw_len = raw.len(),
            text_len = text.len(),
            "PDF text extracted"
        );
        Ok(text)
    }
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self::new(Box::new(PdfTextExtractor))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
