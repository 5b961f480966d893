//! Shard lifecycle: connections, READY pacing and member chunk requests

mod chunks;
mod connector;
mod manager;
mod state;

pub use chunks::MemberChunkRegistry;
pub use connector::{ShardConnection, ShardConnector};
pub use manager::{ShardManager, ShardSettings};
pub use state::{ShardState, ShardStates};
