//! Gateway wire protocol
//!
//! Frames, op codes and the payloads of non-dispatch frames.

mod messages;
mod opcodes;
mod payloads;

pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    Activity, ActivityType, ConnectionProperties, GatewayBotInfo, HelloPayload, IdentifyPayload,
    RequestGuildMembersPayload, StatusType, StatusUpdatePayload,
};
