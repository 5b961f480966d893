//! Shard transport seam
//!
//! Socket framing, heartbeating and the identify handshake belong to the
//! connector. The runtime only sees decoded frames.

use crate::error::GatewayResult;
use crate::protocol::{GatewayMessage, IdentifyPayload};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// An open shard session
#[derive(Debug)]
pub struct ShardConnection {
    /// Frames received from the gateway; closing it ends the shard
    pub incoming: mpsc::Receiver<GatewayMessage>,
    /// Frames to send to the gateway
    pub outgoing: mpsc::Sender<GatewayMessage>,
}

impl ShardConnection {
    pub fn new(incoming: mpsc::Receiver<GatewayMessage>, outgoing: mpsc::Sender<GatewayMessage>) -> Self {
        Self { incoming, outgoing }
    }
}

/// Opens one shard session
///
/// `identify` already carries `[shard_id, shard_count]`.
#[async_trait]
pub trait ShardConnector: Send + Sync {
    async fn connect(&self, gateway_url: &str, identify: IdentifyPayload) -> GatewayResult<ShardConnection>;
}
