//! Voice state - a user's connection to a voice channel

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Voice connection state of one user in one guild
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceState {
    pub guild_id: Option<Snowflake>,
    /// `None` once the user has left voice
    pub channel_id: Option<Snowflake>,
    pub user_id: Snowflake,
    pub session_id: String,
    pub deaf: bool,
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub self_stream: bool,
    pub suppress: bool,
}

impl VoiceState {
    /// Whether the user is connected to a voice channel
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channel_id.is_some()
    }
}
