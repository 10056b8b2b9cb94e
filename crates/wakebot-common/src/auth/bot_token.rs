//! Bot token
//!
//! The static credential presented in Identify, Resume and authorized REST calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bot token, redacted in `Debug` output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotToken(String);

impl BotToken {
    /// Wrap a raw token, stripping a leading `Bot ` prefix if present
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim();
        Self(trimmed.strip_prefix("Bot ").unwrap_or(trimmed).to_string())
    }

    /// The raw token as sent inside gateway payloads
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header for REST calls
    pub fn authorization_header(&self) -> String {
        format!("Bot {}", self.0)
    }

    /// Check if the token is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(***)")
    }
}

impl From<&str> for BotToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
