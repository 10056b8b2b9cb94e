//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Choice {choice} does not match the type of option {option}")]
    InvalidChoice { option: String, choice: String },

    #[error("No pending interaction to reply to")]
    NoPendingInteraction,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl DomainError {
    /// Get error code for logs and API-style reporting
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidChoice { .. } => "INVALID_CHOICE",
            Self::NoPendingInteraction => "NO_PENDING_INTERACTION",
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
        }
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InvalidChoice { .. })
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
