//! Application error types
//!
//! Unified error handling for the bot process.

use crate::config::ConfigError;
use crate::telemetry::TracingError;
use std::fmt;
use wakebot_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Credential errors
    #[error("Bot token rejected by the platform")]
    Unauthorized,

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    // Rate limiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracing(#[from] TracingError),
}

impl AppError {
    /// Get error code for log records
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Whether a later attempt may succeed without operator action
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::GatewayUnavailable(_) | Self::RateLimitExceeded
        )
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(msg: impl fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
