//! Gateway error types

use bot_common::AppError;
use bot_core::Snowflake;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A frame or payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Shard {0} not found")]
    ShardNotFound(u32),

    /// The guild is not cached, so its shard is unknown
    #[error("Guild {0} is not cached")]
    GuildNotCached(Snowflake),

    #[error("Shard {0} channel closed")]
    ChannelClosed(u32),

    #[error("Shard {0} disconnected before READY")]
    Disconnected(u32),

    #[error("Connector error: {0}")]
    Connector(String),

    #[error("Shard manager already started")]
    AlreadyStarted,

    /// Fetching gateway information over REST failed
    #[error(transparent)]
    Rest(#[from] AppError),
}

impl GatewayError {
    pub fn connector(message: impl Into<String>) -> Self {
        Self::Connector(message.into())
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ChannelClosed(_) | Self::Disconnected(_) | Self::Connector(_) => true,
            Self::Rest(e) => !e.is_client_error(),
            _ => false,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
