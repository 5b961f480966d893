//! Records returned by commands that have no cached counterpart

use bot_core::{Snowflake, User};
use serde::{Deserialize, Serialize};

/// Webhook as returned by the upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Snowflake,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Webhook {
    /// Whether the webhook can be executed with its own token
    pub fn is_executable(&self) -> bool {
        self.token.is_some()
    }
}
