//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use crate::auth::BotToken;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use wakebot_core::Snowflake;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub discord: DiscordConfig,
    pub bot: BotConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Platform connection settings
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Bot credential
    pub token: BotToken,
    /// REST API base, including the version segment
    pub api_base_url: String,
    /// Query appended to the resolved gateway endpoint
    pub gateway_query: String,
    /// Gateway intents sent on Identify
    pub intents: u64,
    /// Enforce the outbound gateway send ceiling
    pub rate_limit: bool,
    /// Upper bound for a single REST call
    pub rest_timeout_secs: u64,
}

impl DiscordConfig {
    /// Settings with defaults for everything but the token
    #[must_use]
    pub fn with_token(token: BotToken) -> Self {
        Self {
            token,
            api_base_url: default_api_base_url(),
            gateway_query: default_gateway_query(),
            intents: default_intents(),
            rate_limit: true,
            rest_timeout_secs: default_rest_timeout_secs(),
        }
    }
}

/// Settings of the bot process around the client
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Minimum delay between login attempts while offline
    pub login_interval_ms: u64,
    /// Delay between two ticks of the client
    pub tick_interval_ms: u64,
    /// Register the bot's commands at startup
    pub register_commands: bool,
    /// Register commands for this guild only instead of globally
    pub command_guild_id: Option<Snowflake>,
    /// Reply workers that may run at once before replies carry an overload warning
    pub max_pending_replies: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            login_interval_ms: default_login_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            register_commands: false,
            command_guild_id: None,
            max_pending_replies: default_max_pending_replies(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "wakebot".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_gateway_query() -> String {
    "/?v=10&encoding=json".to_string()
}

fn default_intents() -> u64 {
    4096 // DIRECT_MESSAGES
}

fn default_rest_timeout_secs() -> u64 {
    10
}

fn default_login_interval_ms() -> u64 {
    30_000
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_max_pending_replies() -> usize {
    4
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_BOT_TOKEN")
            .map(BotToken::new)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("DISCORD_BOT_TOKEN"))?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            discord: DiscordConfig {
                token,
                api_base_url: lookup("DISCORD_API_BASE")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_api_base_url),
                gateway_query: lookup("DISCORD_GATEWAY_QUERY").unwrap_or_else(default_gateway_query),
                intents: parse_or(&lookup, "DISCORD_INTENTS", default_intents)?,
                rate_limit: parse_or(&lookup, "DISCORD_RATE_LIMIT", || true)?,
                rest_timeout_secs: parse_or(
                    &lookup,
                    "DISCORD_REST_TIMEOUT_SECS",
                    default_rest_timeout_secs,
                )?,
            },
            bot: BotConfig {
                login_interval_ms: parse_or(
                    &lookup,
                    "BOT_LOGIN_INTERVAL_MS",
                    default_login_interval_ms,
                )?,
                tick_interval_ms: parse_or(&lookup, "BOT_TICK_INTERVAL_MS", default_tick_interval_ms)?,
                register_commands: parse_or(&lookup, "BOT_REGISTER_COMMANDS", || false)?,
                command_guild_id: lookup("BOT_COMMAND_GUILD_ID")
                    .map(|s| {
                        Snowflake::parse(&s)
                            .map_err(|_| ConfigError::InvalidValue("BOT_COMMAND_GUILD_ID", s))
                    })
                    .transpose()?,
                max_pending_replies: parse_or(
                    &lookup,
                    "BOT_MAX_PENDING_REPLIES",
                    default_max_pending_replies,
                )?,
            },
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, key: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    D: FnOnce() -> T,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
