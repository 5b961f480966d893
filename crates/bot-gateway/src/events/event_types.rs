//! Gateway event types
//!
//! Names carried in the `t` field of dispatch frames.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    // Connection
    Ready,
    Resumed,

    // Channels
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,

    // Guilds
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildBanAdd,
    GuildBanRemove,
    GuildEmojisUpdate,

    // Members
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    GuildMembersChunk,

    // Roles
    GuildRoleCreate,
    GuildRoleUpdate,
    GuildRoleDelete,

    // Messages
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    MessageDeleteBulk,

    // Reactions
    MessageReactionAdd,
    MessageReactionRemove,
    MessageReactionRemoveAll,
    MessageReactionRemoveEmoji,

    // Presence and users
    PresenceUpdate,
    TypingStart,
    UserUpdate,

    // Voice and webhooks
    VoiceStateUpdate,
    WebhooksUpdate,
}

impl GatewayEventType {
    /// Every event type, in declaration order
    pub const ALL: [GatewayEventType; 31] = [
        Self::Ready,
        Self::Resumed,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::GuildCreate,
        Self::GuildUpdate,
        Self::GuildDelete,
        Self::GuildBanAdd,
        Self::GuildBanRemove,
        Self::GuildEmojisUpdate,
        Self::GuildMemberAdd,
        Self::GuildMemberRemove,
        Self::GuildMemberUpdate,
        Self::GuildMembersChunk,
        Self::GuildRoleCreate,
        Self::GuildRoleUpdate,
        Self::GuildRoleDelete,
        Self::MessageCreate,
        Self::MessageUpdate,
        Self::MessageDelete,
        Self::MessageDeleteBulk,
        Self::MessageReactionAdd,
        Self::MessageReactionRemove,
        Self::MessageReactionRemoveAll,
        Self::MessageReactionRemoveEmoji,
        Self::PresenceUpdate,
        Self::TypingStart,
        Self::UserUpdate,
        Self::VoiceStateUpdate,
        Self::WebhooksUpdate,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::ChannelUpdate => "CHANNEL_UPDATE",
            Self::ChannelDelete => "CHANNEL_DELETE",
            Self::GuildCreate => "GUILD_CREATE",
            Self::GuildUpdate => "GUILD_UPDATE",
            Self::GuildDelete => "GUILD_DELETE",
            Self::GuildBanAdd => "GUILD_BAN_ADD",
            Self::GuildBanRemove => "GUILD_BAN_REMOVE",
            Self::GuildEmojisUpdate => "GUILD_EMOJIS_UPDATE",
            Self::GuildMemberAdd => "GUILD_MEMBER_ADD",
            Self::GuildMemberRemove => "GUILD_MEMBER_REMOVE",
            Self::GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
            Self::GuildMembersChunk => "GUILD_MEMBERS_CHUNK",
            Self::GuildRoleCreate => "GUILD_ROLE_CREATE",
            Self::GuildRoleUpdate => "GUILD_ROLE_UPDATE",
            Self::GuildRoleDelete => "GUILD_ROLE_DELETE",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageUpdate => "MESSAGE_UPDATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::MessageDeleteBulk => "MESSAGE_DELETE_BULK",
            Self::MessageReactionAdd => "MESSAGE_REACTION_ADD",
            Self::MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
            Self::MessageReactionRemoveAll => "MESSAGE_REACTION_REMOVE_ALL",
            Self::MessageReactionRemoveEmoji => "MESSAGE_REACTION_REMOVE_EMOJI",
            Self::PresenceUpdate => "PRESENCE_UPDATE",
            Self::TypingStart => "TYPING_START",
            Self::UserUpdate => "USER_UPDATE",
            Self::VoiceStateUpdate => "VOICE_STATE_UPDATE",
            Self::WebhooksUpdate => "WEBHOOKS_UPDATE",
        }
    }

    /// Parse an event type from its wire name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == s)
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
