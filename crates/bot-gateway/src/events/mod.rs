//! Gateway events
//!
//! Wire event names, the typed events re-emitted after cache updates and the
//! handler registry they are delivered to.

mod bot_event;
mod event_types;
mod handlers;

pub use bot_event::{BotEvent, EventKind, GuildChange, MemberOrUser, MessageSnapshot, ReactionEvent};
pub use event_types::GatewayEventType;
pub use handlers::{EventCallback, EventHandlers, HeartbeatCallback, RawCallback};
