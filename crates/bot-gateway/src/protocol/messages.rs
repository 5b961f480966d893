//! Gateway frame format

use super::{HelloPayload, IdentifyPayload, OpCode, RequestGuildMembersPayload, StatusUpdatePayload};
use crate::events::GatewayEventType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway frame
///
/// Every frame exchanged with the gateway follows this format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    fn new(op: OpCode, d: Option<Value>) -> Self {
        Self { op, t: None, s: None, d }
    }

    // === Received frames ===

    /// Create a Dispatch frame (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Hello frame (op=10)
    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self::new(
            OpCode::Hello,
            serde_json::to_value(HelloPayload { heartbeat_interval }).ok(),
        )
    }

    /// Create a Heartbeat ACK frame (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::new(OpCode::HeartbeatAck, None)
    }

    // === Sent frames ===

    /// Create a Heartbeat frame (op=1) carrying the last sequence seen
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::new(OpCode::Heartbeat, last_sequence.map(|s| Value::Number(s.into())))
    }

    /// Create an Identify frame (op=2)
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::new(OpCode::Identify, serde_json::to_value(payload).ok())
    }

    /// Create a Status Update frame (op=3)
    #[must_use]
    pub fn status_update(payload: &StatusUpdatePayload) -> Self {
        Self::new(OpCode::StatusUpdate, serde_json::to_value(payload).ok())
    }

    /// Create a Request Guild Members frame (op=8)
    #[must_use]
    pub fn request_guild_members(payload: &RequestGuildMembersPayload) -> Self {
        Self::new(OpCode::RequestGuildMembers, serde_json::to_value(payload).ok())
    }

    // === Parsing ===

    /// Known event type of a Dispatch frame
    pub fn event_type(&self) -> Option<GatewayEventType> {
        if self.op != OpCode::Dispatch {
            return None;
        }
        self.t.as_deref().and_then(GatewayEventType::from_str)
    }

    /// Try to parse as a Hello payload (op=10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as an Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as a Status Update payload (op=3)
    pub fn as_status_update(&self) -> Option<StatusUpdatePayload> {
        if self.op != OpCode::StatusUpdate {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as a Request Guild Members payload (op=8)
    pub fn as_request_guild_members(&self) -> Option<RequestGuildMembersPayload> {
        if self.op != OpCode::RequestGuildMembers {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Whether an Invalid Session frame allows resuming
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}
