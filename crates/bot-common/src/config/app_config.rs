//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file).

use bot_core::Intents;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub rest: RestConfig,
    pub gateway: GatewayConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
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
}

/// Bot identity
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub intents: Intents,
    /// `None` means use the shard count suggested by the gateway endpoint
    pub shard_count: Option<u32>,
}

// Keep the token out of logs
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .field("shard_count", &self.shard_count)
            .finish()
    }
}

/// REST dispatcher settings
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub api_base: String,
    pub max_retries: u32,
    pub drain_interval: Duration,
    pub sweep_interval: Duration,
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            max_retries: default_max_retries(),
            drain_interval: Duration::from_millis(default_interval_ms()),
            sweep_interval: Duration::from_millis(default_interval_ms()),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }
}

/// How MESSAGE_UPDATE frames are applied to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageUpdatePolicy {
    /// Any edit carrying an `edited_timestamp` patches the cached message
    #[default]
    AnyEdit,
    /// Only apply the update when the content did not change
    Legacy,
}

impl FromStr for MessageUpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any_edit" => Ok(Self::AnyEdit),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown message update policy `{other}`")),
        }
    }
}

/// Gateway and shard settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub compress: bool,
    /// Wait after one shard's READY before the next shard identifies
    pub shard_cooldown: Duration,
    /// Capacity of the shard-to-router frame channel
    pub frame_buffer: usize,
    pub message_update_policy: MessageUpdatePolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            compress: true,
            shard_cooldown: Duration::from_millis(default_shard_cooldown_ms()),
            frame_buffer: default_frame_buffer(),
            message_update_policy: MessageUpdatePolicy::default(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "bot-runtime".to_string()
}

fn default_api_base() -> String {
    "https://discord.com/api/v6".to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_shard_cooldown_ms() -> u64 {
    5000
}

fn default_frame_buffer() -> usize {
    1024
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `BOT_TOKEN` is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let intents = match lookup("BOT_INTENTS") {
            Some(raw) => {
                Intents::parse(&raw).map_err(|_| ConfigError::InvalidValue("BOT_INTENTS", raw))?
            }
            None => Intents::default(),
        };

        let shard_count = match lookup("BOT_SHARD_COUNT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or(ConfigError::InvalidValue("BOT_SHARD_COUNT", raw))?,
            ),
            None => None,
        };

        let message_update_policy = match lookup("GATEWAY_MESSAGE_UPDATE_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_MESSAGE_UPDATE_POLICY", raw))?,
            None => MessageUpdatePolicy::default(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            bot: BotConfig {
                token: lookup("BOT_TOKEN")
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(ConfigError::MissingVar("BOT_TOKEN"))?,
                intents,
                shard_count,
            },
            rest: RestConfig {
                api_base: lookup("REST_API_BASE")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_api_base),
                max_retries: parse_or(&lookup, "REST_MAX_RETRIES", default_max_retries())?,
                drain_interval: Duration::from_millis(parse_or(
                    &lookup,
                    "REST_DRAIN_INTERVAL_MS",
                    default_interval_ms(),
                )?),
                sweep_interval: Duration::from_millis(parse_or(
                    &lookup,
                    "REST_SWEEP_INTERVAL_MS",
                    default_interval_ms(),
                )?),
                timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "REST_TIMEOUT_SECS",
                    default_timeout_secs(),
                )?),
            },
            gateway: GatewayConfig {
                compress: parse_or(&lookup, "GATEWAY_COMPRESS", true)?,
                shard_cooldown: Duration::from_millis(parse_or(
                    &lookup,
                    "GATEWAY_SHARD_COOLDOWN_MS",
                    default_shard_cooldown_ms(),
                )?),
                frame_buffer: parse_or(&lookup, "GATEWAY_FRAME_BUFFER", default_frame_buffer())?,
                message_update_policy,
            },
        })
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
