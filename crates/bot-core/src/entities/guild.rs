//! Guild entity - the cached mirror of a server and its nested state

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{Emoji, GuildMember, Role, VoiceState};
use crate::value_objects::{Permissions, Snowflake};

/// Guild (server) entity
///
/// Roles, members, emojis and voice states live inside the guild record.
/// Scalar attributes without a typed field are kept in `extra` so updates
/// can be diffed key by key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Snowflake,
    pub shard_id: u32,
    pub member_count: u64,
    pub roles: HashMap<Snowflake, Role>,
    pub members: HashMap<Snowflake, GuildMember>,
    pub channel_ids: Vec<Snowflake>,
    pub emojis: Vec<Emoji>,
    pub voice_states: HashMap<Snowflake, VoiceState>,
    pub extra: Map<String, Value>,
}

impl Guild {
    /// Create a new Guild
    pub fn new(id: Snowflake, name: impl Into<String>, owner_id: Snowflake) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            ..Self::default()
        }
    }

    /// Check if a user is the guild owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// The implicit @everyone role (id == guild id)
    pub fn everyone_role(&self) -> Option<&Role> {
        self.roles.get(&self.id)
    }

    /// Permissions granted to everyone in the guild
    pub fn everyone_permissions(&self) -> Permissions {
        self.everyone_role()
            .map(|r| r.permissions)
            .unwrap_or_default()
    }

    /// Cached roles held by a member; ids without a cached role are skipped
    pub fn member_roles<'a>(&'a self, member: &'a GuildMember) -> impl Iterator<Item = &'a Role> + 'a {
        member.role_ids.iter().filter_map(|id| self.roles.get(id))
    }

    /// Roles ordered from most to least senior
    pub fn sorted_roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.values().collect();
        roles.sort_by(|a, b| b.seniority(a));
        roles
    }

    /// Get the guild icon path if set
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("/icons/{}/{}.png", self.id, hash))
    }

    /// Link a channel to this guild
    pub fn add_channel(&mut self, channel_id: Snowflake) {
        if !self.channel_ids.contains(&channel_id) {
            self.channel_ids.push(channel_id);
        }
    }

    /// Unlink a channel from this guild
    pub fn remove_channel(&mut self, channel_id: Snowflake) {
        self.channel_ids.retain(|&id| id != channel_id);
    }
}
