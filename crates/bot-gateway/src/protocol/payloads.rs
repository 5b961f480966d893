//! Gateway payload types
//!
//! Payloads of the non-dispatch frames: identify, status updates, member
//! requests and the connection handshake.

use bot_core::{Intents, Snowflake};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Client properties sent with Identify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProperties {
    #[serde(rename = "$os")]
    pub os: String,
    #[serde(rename = "$browser")]
    pub browser: String,
    #[serde(rename = "$device")]
    pub device: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "bot-runtime".to_string(),
            device: "bot-runtime".to_string(),
        }
    }
}

/// Identify payload (op=2)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub properties: ConnectionProperties,
    pub intents: Intents,
    /// `[shard_id, shard_count]`
    pub shard: [u32; 2],
}

impl IdentifyPayload {
    pub fn new(token: impl Into<String>, intents: Intents, shard_count: u32) -> Self {
        Self {
            token: token.into(),
            compress: true,
            properties: ConnectionProperties::default(),
            intents,
            shard: [0, shard_count.max(1)],
        }
    }

    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Copy of this payload identifying as another shard
    #[must_use]
    pub fn for_shard(&self, shard_id: u32) -> Self {
        let mut payload = self.clone();
        payload.shard[0] = shard_id;
        payload
    }

    pub fn shard_id(&self) -> u32 {
        self.shard[0]
    }

    pub fn shard_count(&self) -> u32 {
        self.shard[1]
    }
}

impl std::fmt::Debug for IdentifyPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyPayload")
            .field("token", &"[REDACTED]")
            .field("compress", &self.compress)
            .field("intents", &self.intents)
            .field("shard", &self.shard)
            .finish_non_exhaustive()
    }
}

/// Hello payload (op=10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Presence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    #[default]
    Online,
    Dnd,
    Idle,
    Invisible,
    Offline,
}

/// Kind of activity shown under the bot's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ActivityType {
    #[default]
    Game = 0,
    Streaming = 1,
    Listening = 2,
    Custom = 4,
}

impl ActivityType {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Game),
            1 => Some(Self::Streaming),
            2 => Some(Self::Listening),
            4 => Some(Self::Custom),
            _ => None,
        }
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| serde::de::Error::custom(format!("invalid activity type: {value}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
}

impl Activity {
    pub fn new(name: impl Into<String>, kind: ActivityType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Status update payload (op=3)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusUpdatePayload {
    /// Unix time in milliseconds when the client went idle
    pub since: Option<u64>,
    pub game: Option<Activity>,
    pub status: StatusType,
    #[serde(default)]
    pub afk: bool,
}

impl StatusUpdatePayload {
    pub fn new(status: StatusType, game: Option<Activity>) -> Self {
        Self {
            since: None,
            game,
            status,
            afk: false,
        }
    }
}

/// Request guild members payload (op=8)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestGuildMembersPayload {
    pub guild_id: Snowflake,
    /// Username prefix; empty for every member
    #[serde(default)]
    pub query: String,
    /// Maximum members to send; 0 for no limit
    #[serde(default)]
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl RequestGuildMembersPayload {
    /// Ask for every member of a guild
    pub fn all(guild_id: Snowflake, nonce: impl Into<String>) -> Self {
        Self {
            guild_id,
            query: String::new(),
            limit: 0,
            nonce: Some(nonce.into()),
        }
    }
}

/// Response of `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayBotInfo {
    pub url: String,
    /// Recommended number of shards
    pub shards: u32,
    #[serde(default)]
    pub session_start_limit: Option<Value>,
}
