//! Typed events emitted after the cache has been updated

use bot_core::{
    Attachment, Channel, Emoji, Guild, GuildMember, Message, ReactionEmoji, Role, Snowflake, User, VoiceState,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// One changed guild property
#[derive(Debug, Clone, PartialEq)]
pub struct GuildChange {
    pub key: String,
    pub old: Value,
    pub new: Value,
}

/// The cached member when known, the raw user otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum MemberOrUser {
    Member(GuildMember),
    User(User),
}

impl MemberOrUser {
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Member(member) => member.id(),
            Self::User(user) => user.id,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            Self::Member(member) => &member.user,
            Self::User(user) => user,
        }
    }
}

/// Message fields as they were before an edit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageSnapshot {
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub embeds: Vec<Value>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub tts: bool,
    pub pinned: bool,
}

impl From<&Message> for MessageSnapshot {
    fn from(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            embeds: message.embeds.clone(),
            edited_timestamp: message.edited_timestamp,
            tts: message.tts,
            pinned: message.pinned,
        }
    }
}

/// A reaction added or removed; `message` is set when the message is cached
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEvent {
    pub message: Option<Message>,
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub user_id: Snowflake,
    pub emoji: ReactionEmoji,
}

/// Events delivered to [`EventHandlers`](super::EventHandlers)
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    Ready {
        shard_id: u32,
        user: User,
        session_id: String,
    },

    ChannelCreate(Channel),
    ChannelUpdate {
        channel: Channel,
        old: Channel,
    },
    ChannelDelete(Channel),

    GuildCreate(Box<Guild>),
    GuildUpdate {
        guild: Box<Guild>,
        changes: Vec<GuildChange>,
    },
    GuildDelete(Box<Guild>),
    GuildBanAdd {
        guild_id: Snowflake,
        target: MemberOrUser,
    },
    GuildBanRemove {
        guild_id: Snowflake,
        target: MemberOrUser,
    },
    GuildEmojisUpdate {
        guild_id: Snowflake,
        emojis: Vec<Emoji>,
        old: Vec<Emoji>,
    },

    GuildMemberAdd(GuildMember),
    GuildMemberRemove {
        guild_id: Snowflake,
        target: MemberOrUser,
    },
    GuildMemberUpdate {
        member: GuildMember,
        old: Option<GuildMember>,
    },
    NicknameUpdate {
        member: GuildMember,
        nickname: Option<String>,
        old: Option<String>,
    },
    RoleGained {
        member: GuildMember,
        role_id: Snowflake,
    },
    RoleLost {
        member: GuildMember,
        role_id: Snowflake,
    },

    RoleCreate {
        guild_id: Snowflake,
        role: Role,
    },
    RoleUpdate {
        guild_id: Snowflake,
        role: Role,
        old: Role,
    },
    RoleDelete {
        guild_id: Snowflake,
        role: Role,
    },

    MessageCreate(Message),
    MessageUpdate {
        message: Message,
        old: MessageSnapshot,
    },
    MessageDelete(Message),

    ReactionAdd(ReactionEvent),
    ReactionRemove(ReactionEvent),
    ReactionRemoveAll(Value),
    ReactionRemoveEmoji(Value),

    PresenceUpdate(Value),
    TypingStart(Value),
    BotUserUpdate(User),

    VoiceChannelJoin {
        member: GuildMember,
        channel_id: Snowflake,
    },
    VoiceChannelLeave {
        member: GuildMember,
        channel_id: Snowflake,
    },
    VoiceChannelSwitch {
        member: GuildMember,
        channel_id: Snowflake,
        old_channel_id: Snowflake,
    },
    VoiceStateUpdate {
        member: GuildMember,
        state: VoiceState,
    },

    WebhooksUpdate {
        channel_id: Snowflake,
        guild_id: Snowflake,
    },
}

/// Handler slot keys, one per [`BotEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildBanAdd,
    GuildBanRemove,
    GuildEmojisUpdate,
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    NicknameUpdate,
    RoleGained,
    RoleLost,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    ReactionAdd,
    ReactionRemove,
    ReactionRemoveAll,
    ReactionRemoveEmoji,
    PresenceUpdate,
    TypingStart,
    BotUserUpdate,
    VoiceChannelJoin,
    VoiceChannelLeave,
    VoiceChannelSwitch,
    VoiceStateUpdate,
    WebhooksUpdate,
}

impl BotEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Ready { .. } => EventKind::Ready,
            Self::ChannelCreate(_) => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete(_) => EventKind::ChannelDelete,
            Self::GuildCreate(_) => EventKind::GuildCreate,
            Self::GuildUpdate { .. } => EventKind::GuildUpdate,
            Self::GuildDelete(_) => EventKind::GuildDelete,
            Self::GuildBanAdd { .. } => EventKind::GuildBanAdd,
            Self::GuildBanRemove { .. } => EventKind::GuildBanRemove,
            Self::GuildEmojisUpdate { .. } => EventKind::GuildEmojisUpdate,
            Self::GuildMemberAdd(_) => EventKind::GuildMemberAdd,
            Self::GuildMemberRemove { .. } => EventKind::GuildMemberRemove,
            Self::GuildMemberUpdate { .. } => EventKind::GuildMemberUpdate,
            Self::NicknameUpdate { .. } => EventKind::NicknameUpdate,
            Self::RoleGained { .. } => EventKind::RoleGained,
            Self::RoleLost { .. } => EventKind::RoleLost,
            Self::RoleCreate { .. } => EventKind::RoleCreate,
            Self::RoleUpdate { .. } => EventKind::RoleUpdate,
            Self::RoleDelete { .. } => EventKind::RoleDelete,
            Self::MessageCreate(_) => EventKind::MessageCreate,
            Self::MessageUpdate { .. } => EventKind::MessageUpdate,
            Self::MessageDelete(_) => EventKind::MessageDelete,
            Self::ReactionAdd(_) => EventKind::ReactionAdd,
            Self::ReactionRemove(_) => EventKind::ReactionRemove,
            Self::ReactionRemoveAll(_) => EventKind::ReactionRemoveAll,
            Self::ReactionRemoveEmoji(_) => EventKind::ReactionRemoveEmoji,
            Self::PresenceUpdate(_) => EventKind::PresenceUpdate,
            Self::TypingStart(_) => EventKind::TypingStart,
            Self::BotUserUpdate(_) => EventKind::BotUserUpdate,
            Self::VoiceChannelJoin { .. } => EventKind::VoiceChannelJoin,
            Self::VoiceChannelLeave { .. } => EventKind::VoiceChannelLeave,
            Self::VoiceChannelSwitch { .. } => EventKind::VoiceChannelSwitch,
            Self::VoiceStateUpdate { .. } => EventKind::VoiceStateUpdate,
            Self::WebhooksUpdate { .. } => EventKind::WebhooksUpdate,
        }
    }
}
