//! Member entity - a user's membership in a guild

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;
use crate::value_objects::Snowflake;

/// Guild member entity (junction between User and Guild)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildMember {
    pub user: User,
    pub guild_id: Snowflake,
    #[serde(rename = "nick")]
    pub nickname: Option<String>,
    #[serde(rename = "roles")]
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub deaf: bool,
    pub mute: bool,
}

impl GuildMember {
    /// Create a new GuildMember
    pub fn new(guild_id: Snowflake, user: User) -> Self {
        Self {
            user,
            guild_id,
            ..Self::default()
        }
    }

    /// Id of the underlying user
    #[inline]
    pub fn id(&self) -> Snowflake {
        self.user.id
    }

    /// Get display name (nickname if set, otherwise username)
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Add a role to the member
    pub fn add_role(&mut self, role_id: Snowflake) {
        if !self.has_role(role_id) {
            self.role_ids.push(role_id);
        }
    }

    /// Remove a role from the member
    pub fn remove_role(&mut self, role_id: Snowflake) {
        self.role_ids.retain(|&id| id != role_id);
    }
}
