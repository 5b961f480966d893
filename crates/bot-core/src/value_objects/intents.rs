//! Gateway intents - which event groups a shard subscribes to

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Gateway intent flags sent with IDENTIFY
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS                   = 1 << 0;
        const GUILD_MEMBERS            = 1 << 1;
        const GUILD_BANS               = 1 << 2;
        const GUILD_EMOJIS             = 1 << 3;
        const GUILD_INTEGRATIONS       = 1 << 4;
        const GUILD_WEBHOOKS           = 1 << 5;
        const GUILD_INVITES            = 1 << 6;
        const GUILD_VOICE_STATES       = 1 << 7;
        const GUILD_PRESENCES          = 1 << 8;
        const GUILD_MESSAGES           = 1 << 9;
        const GUILD_MESSAGE_REACTIONS  = 1 << 10;
        const GUILD_MESSAGE_TYPING     = 1 << 11;
        const DIRECT_MESSAGES          = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING    = 1 << 14;
    }
}

impl Intents {
    /// Intents that need to be enabled for the application before use
    pub const PRIVILEGED: Intents = Intents::GUILD_MEMBERS.union(Intents::GUILD_PRESENCES);

    /// Parse from a decimal mask, dropping unknown bits
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.trim().parse::<u64>().map(Intents::from_bits_truncate)
    }

    /// Check if any privileged intent is requested
    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.intersects(Self::PRIVILEGED)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::GUILDS | Intents::GUILD_MESSAGES
    }
}

// Intents go over the wire as a plain integer
impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}
