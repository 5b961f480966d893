//! # bot-gateway
//!
//! Sharded gateway client: wire protocol, shard bootstrap and the router that
//! applies dispatches to the entity cache before re-emitting them as typed
//! events.

pub mod client;
pub mod error;
pub mod events;
pub mod protocol;
pub mod router;
pub mod shard;

// Re-export commonly used types at crate root
pub use client::BotClient;
pub use error::{GatewayError, GatewayResult};
pub use events::{BotEvent, EventHandlers, EventKind, GatewayEventType, MemberOrUser, MessageSnapshot, ReactionEvent};
pub use protocol::{Activity, ActivityType, GatewayBotInfo, GatewayMessage, IdentifyPayload, OpCode, StatusType};
pub use router::ShardRouter;
pub use shard::{
    MemberChunkRegistry, ShardConnection, ShardConnector, ShardManager, ShardSettings, ShardState, ShardStates,
};
