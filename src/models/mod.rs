pub mod enums;
pub mod patient;
pub mod analysis;

pub use enums::*;
pub use patient::*;
pub use analysis::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
