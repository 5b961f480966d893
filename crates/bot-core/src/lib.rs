//! # bot-core
//!
//! Domain layer containing snowflake ids, permission and intent flags, the
//! cached entities, and debug events.
//! This crate has zero dependencies on infrastructure (HTTP, gateway, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Channel, ChannelType, Emoji, Guild, GuildMember, Message, OverwriteType,
    PermissionOverwrite, ReactionCount, ReactionEmoji, Role, User, VoiceState,
};
pub use error::DomainError;
pub use events::{emit_debug, DebugEvent, DebugHook};
pub use value_objects::{Intents, Permissions, Snowflake, SnowflakeParseError};
