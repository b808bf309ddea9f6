//! Validation error types

use thiserror::Error;

/// Why an inbound payload was rejected.
///
/// The variants are deliberately specific: rejection reasons end up in
/// diagnostic logs and need to point at the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("missing event type discriminator")]
    MissingType,

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
