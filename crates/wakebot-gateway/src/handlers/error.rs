//! Handler error types

use thiserror::Error;

/// Why an inbound frame was dropped
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The frame is not a valid `{op, t, s, d}` document
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// A dispatch frame without an event name
    #[error("Dispatch frame without an event name")]
    MissingEventName,

    /// The `d` member does not match what the op or event requires
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

impl HandlerError {
    pub(crate) fn invalid_payload(kind: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPayload {
            kind: kind.into(),
            reason: reason.to_string(),
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
