pub mod enums;
pub mod patient;

pub use enums::*;
pub use patient::*;

/// Rejections from validating server payloads and enum vocabularies.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Field {field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("Field {field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("Treatment {index}: invalid date {value:?}")]
    InvalidDate { index: usize, value: String },

    #[error("Treatment {index}: invalid estimated cost {value:?}")]
    InvalidCost { index: usize, value: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
