//! User entity - an account as seen by the bot

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// User account, shared by members, message authors and mentions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    pub avatar: Option<String>,
    pub bot: bool,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: Snowflake, username: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            discriminator: discriminator.into(),
            avatar: None,
            bot: false,
        }
    }

    /// Get the full tag: username#discriminator
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Get avatar path or default avatar path
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("/avatars/{}/{}.png", self.id, hash),
            None => format!("/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    /// Get default avatar index (0-4) based on discriminator
    fn default_avatar_index(&self) -> u8 {
        (self.discriminator.parse::<u16>().unwrap_or(0) % 5) as u8
    }

    /// Check if user is a bot account
    #[inline]
    pub fn is_bot(&self) -> bool {
        self.bot
    }

    /// Apply the fields of a fresh user payload, keeping the id
    pub fn patch(&mut self, other: &User) {
        self.username.clone_from(&other.username);
        self.discriminator.clone_from(&other.discriminator);
        self.avatar.clone_from(&other.avatar);
        self.bot = other.bot;
    }
}
