//! REST errors

use wakebot_common::AppError;
use wakebot_core::TransportError;

/// Failure of a REST call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestError {
    #[error("Not authorized (401)")]
    Unauthorized,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Request body could not be encoded: {0}")]
    Encode(String),

    #[error("No async runtime available to run the request")]
    NoRuntime,
}

impl RestError {
    /// Check if the platform rejected the bot token
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<RestError> for AppError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Unauthorized => AppError::Unauthorized,
            RestError::Transport(e) => AppError::transport(e),
            other => AppError::internal(other),
        }
    }
}
