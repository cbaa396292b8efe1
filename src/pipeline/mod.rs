pub mod extraction;
pub mod analysis;
pub mod fallback;
pub mod processor;

pub use processor::{ProcessingError, ReportProcessor};
