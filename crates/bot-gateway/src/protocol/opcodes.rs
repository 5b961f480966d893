//! Gateway operation codes

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
///
/// Op codes define the type of frame exchanged with the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// An event was dispatched (receive only)
    Dispatch = 0,
    /// Keep the connection alive (send/receive)
    Heartbeat = 1,
    /// Start a new session (send only)
    Identify = 2,
    /// Update the bot's presence (send only)
    StatusUpdate = 3,
    /// Join, move or leave a voice channel (send only)
    VoiceStateUpdate = 4,
    /// Resume a dropped session (send only)
    Resume = 6,
    /// The gateway asks the client to reconnect (receive only)
    Reconnect = 7,
    /// Ask for the member list of a guild (send only)
    RequestGuildMembers = 8,
    /// The session was invalidated (receive only)
    InvalidSession = 9,
    /// Sent right after connecting (receive only)
    Hello = 10,
    /// Heartbeat acknowledged (receive only)
    HeartbeatAck = 11,
}

impl OpCode {
    /// Create an `OpCode` from a raw integer value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::StatusUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestGuildMembers),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if the client may send this op code
    #[must_use]
    pub const fn is_client_op(self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::Identify
                | Self::StatusUpdate
                | Self::VoiceStateUpdate
                | Self::Resume
                | Self::RequestGuildMembers
        )
    }

    /// Check if the gateway may send this op code
    #[must_use]
    pub const fn is_server_op(self) -> bool {
        matches!(
            self,
            Self::Dispatch
                | Self::Heartbeat
                | Self::Reconnect
                | Self::InvalidSession
                | Self::Hello
                | Self::HeartbeatAck
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::StatusUpdate => "StatusUpdate",
            Self::VoiceStateUpdate => "VoiceStateUpdate",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::RequestGuildMembers => "RequestGuildMembers",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| serde::de::Error::custom(format!("invalid op code: {value}")))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}
