//! Permission bitflags
//!
//! The 31 upstream permission bits, stored as a 64-bit mask.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Guild and channel permission flags
    ///
    /// Only the set operations (`|`, `&`, `!`) are used on these; raw integer
    /// arithmetic stays inside this module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS          = 1 << 1;
        const BAN_MEMBERS           = 1 << 2;
        /// Implicitly grants every other permission and bypasses overwrites
        const ADMINISTRATOR         = 1 << 3;
        const MANAGE_CHANNELS       = 1 << 4;
        const MANAGE_GUILD          = 1 << 5;
        const ADD_REACTIONS         = 1 << 6;
        const VIEW_AUDIT_LOG        = 1 << 7;
        const PRIORITY_SPEAKER      = 1 << 8;
        const STREAM                = 1 << 9;
        const VIEW_CHANNEL          = 1 << 10;
        const SEND_MESSAGES         = 1 << 11;
        const SEND_TTS_MESSAGES     = 1 << 12;
        const MANAGE_MESSAGES       = 1 << 13;
        const EMBED_LINKS           = 1 << 14;
        const ATTACH_FILES          = 1 << 15;
        const READ_MESSAGE_HISTORY  = 1 << 16;
        const MENTION_EVERYONE      = 1 << 17;
        const USE_EXTERNAL_EMOJIS   = 1 << 18;
        const VIEW_GUILD_INSIGHTS   = 1 << 19;
        const CONNECT               = 1 << 20;
        const SPEAK                 = 1 << 21;
        const MUTE_MEMBERS          = 1 << 22;
        const DEAFEN_MEMBERS        = 1 << 23;
        const MOVE_MEMBERS          = 1 << 24;
        const USE_VAD               = 1 << 25;
        const CHANGE_NICKNAME       = 1 << 26;
        const MANAGE_NICKNAMES      = 1 << 27;
        const MANAGE_ROLES          = 1 << 28;
        const MANAGE_WEBHOOKS       = 1 << 29;
        const MANAGE_EMOJIS         = 1 << 30;

        /// Every defined permission (guild owners, administrators)
        const ALL = (1 << 31) - 1;
    }
}

impl Permissions {
    /// Check if the permission set contains every required bit
    ///
    /// Administrators pass every check.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Check if the permission set has any of the given permissions
    #[inline]
    pub fn has_any(&self, permissions: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.intersects(permissions)
    }

    /// Expand an administrator mask to `ALL`, otherwise return the mask unchanged
    #[inline]
    #[must_use]
    pub fn resolve_admin(self) -> Self {
        if self.contains(Permissions::ADMINISTRATOR) {
            Permissions::ALL
        } else {
            self
        }
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Split a mask into its single-bit flags, in bit order
    pub fn flags(self) -> impl Iterator<Item = Permissions> {
        self.iter()
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_truncate)
    }

    /// Names of every individual flag that is set
    pub fn list(&self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(name, _)| *name != "ALL")
            .map(|(name, _)| name)
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialize as string, the upstream form for 64-bit masks
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_truncate(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(perms: Permissions) -> Self {
        perms.bits()
    }
}
