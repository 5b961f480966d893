//! Domain entities - the records mirrored in the cache

mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod reaction;
mod role;
mod user;
mod voice_state;

pub use channel::{Channel, ChannelType, OverwriteType, PermissionOverwrite};
pub use emoji::Emoji;
pub use guild::Guild;
pub use member::GuildMember;
pub use message::{Attachment, Message};
pub use reaction::{ReactionCount, ReactionEmoji};
pub use role::Role;
pub use user::User;
pub use voice_state::VoiceState;
