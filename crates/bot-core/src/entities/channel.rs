//! Channel entity - text, voice, category or DM channels

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value_objects::{Permissions, Snowflake};

/// Channel type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ChannelType {
    /// Guild text channel
    #[default]
    GuildText = 0,
    /// Direct message between users
    Dm = 1,
    GuildVoice = 2,
    GroupDm = 3,
    /// Guild category for organizing channels
    GuildCategory = 4,
    GuildNews = 5,
    GuildStore = 6,
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildNews,
            6 => Self::GuildStore,
            _ => Self::GuildText, // Default for 0 and unknown values
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(ct: ChannelType) -> Self {
        ct as u8
    }
}

impl Serialize for ChannelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*self))
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(ChannelType::from)
    }
}

/// Target of a permission overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverwriteType {
    #[default]
    Role,
    Member,
}

impl Serialize for OverwriteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Self::Role => 0,
            Self::Member => 1,
        })
    }
}

// Older gateway versions send "role"/"member", newer ones 0/1
impl<'de> Deserialize<'de> for OverwriteType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct OverwriteTypeVisitor;

        impl Visitor<'_> for OverwriteTypeVisitor {
            type Value = OverwriteType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("\"role\", \"member\", 0 or 1")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<OverwriteType, E> {
                match value {
                    0 => Ok(OverwriteType::Role),
                    1 => Ok(OverwriteType::Member),
                    other => Err(de::Error::custom(format!("unknown overwrite type {other}"))),
                }
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<OverwriteType, E> {
                self.visit_u64(value.max(0) as u64)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<OverwriteType, E> {
                match value {
                    "role" => Ok(OverwriteType::Role),
                    "member" => Ok(OverwriteType::Member),
                    other => Err(de::Error::custom(format!("unknown overwrite type {other}"))),
                }
            }
        }

        deserializer.deserialize_any(OverwriteTypeVisitor)
    }
}

/// Per-channel allow/deny override for a role or a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: OverwriteType,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: i32,
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    pub permission_overwrites: Vec<PermissionOverwrite>,
    pub last_message_id: Option<Snowflake>,
}

impl Channel {
    /// Create a new guild text channel
    #[must_use]
    pub fn new_text(id: Snowflake, guild_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            guild_id: Some(guild_id),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Create a new DM channel
    #[must_use]
    pub fn new_dm(id: Snowflake) -> Self {
        Self {
            id,
            channel_type: ChannelType::Dm,
            ..Self::default()
        }
    }

    /// Check if this is a DM channel (no guild, exempt from permission checks)
    #[inline]
    #[must_use]
    pub fn is_dm(&self) -> bool {
        self.guild_id.is_none()
    }

    /// Check if this is a category
    #[inline]
    #[must_use]
    pub fn is_category(&self) -> bool {
        matches!(self.channel_type, ChannelType::GuildCategory)
    }

    /// Get display name (channel name or fallback for DMs)
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Direct Message")
    }

    /// Overwrite targeting the given role or member id
    pub fn overwrite_for(&self, id: Snowflake, kind: OverwriteType) -> Option<&PermissionOverwrite> {
        self.permission_overwrites
            .iter()
            .find(|o| o.id == id && o.kind == kind)
    }
}
