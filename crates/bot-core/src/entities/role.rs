//! Role entity - a guild role carrying a permission mask

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::value_objects::{Permissions, Snowflake};

/// Role entity
///
/// The implicit `@everyone` role shares its id with the guild.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub position: i32,
    pub permissions: Permissions,
    pub managed: bool,
    pub mentionable: bool,
}

impl Role {
    /// Create a new Role
    pub fn new(id: Snowflake, name: impl Into<String>, permissions: Permissions) -> Self {
        Self {
            id,
            name: name.into(),
            permissions,
            ..Self::default()
        }
    }

    /// Create the @everyone role for a guild
    pub fn everyone(guild_id: Snowflake, permissions: Permissions) -> Self {
        Self::new(guild_id, "@everyone", permissions)
    }

    /// Whether this is the @everyone role of the given guild
    #[inline]
    pub fn is_everyone(&self, guild_id: Snowflake) -> bool {
        self.id == guild_id
    }

    /// Check if this role grants a specific permission
    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }

    /// Hierarchy order: higher position first, ties go to the lower id
    pub fn seniority(&self, other: &Role) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| other.id.cmp(&self.id))
    }

    /// Compare role positions for hierarchy
    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        self.seniority(other) == Ordering::Greater
    }

    /// Get the color as a hex string (without #)
    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }
}
