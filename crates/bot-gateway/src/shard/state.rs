//! Per-shard lifecycle state

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;

/// Shard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardState {
    /// Connected, waiting for READY
    AwaitingIdentify,
    /// READY received
    Identified,
    /// Frame stream ended
    Disconnected,
}

/// Shared view of every shard's state
///
/// The router marks shards identified; the manager waits on those changes
/// to pace the bootstrap.
#[derive(Debug)]
pub struct ShardStates {
    states: watch::Sender<HashMap<u32, ShardState>>,
}

impl Default for ShardStates {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardStates {
    #[must_use]
    pub fn new() -> Self {
        let (states, _) = watch::channel(HashMap::new());
        Self { states }
    }

    pub fn get(&self, shard_id: u32) -> Option<ShardState> {
        self.states.borrow().get(&shard_id).copied()
    }

    pub fn set(&self, shard_id: u32, state: ShardState) {
        self.states.send_modify(|states| {
            states.insert(shard_id, state);
        });
        tracing::debug!(shard_id, state = ?state, "Shard state changed");
    }

    /// Number of shards that have received READY
    pub fn identified(&self) -> usize {
        self.states
            .borrow()
            .values()
            .filter(|s| **s == ShardState::Identified)
            .count()
    }

    /// Wait until the shard leaves `AwaitingIdentify`, returning its new state
    pub async fn wait_settled(&self, shard_id: u32) -> ShardState {
        let mut rx = self.states.subscribe();
        let settled = rx
            .wait_for(|states| {
                matches!(
                    states.get(&shard_id),
                    Some(ShardState::Identified | ShardState::Disconnected)
                )
            })
            .await
            .ok()
            .and_then(|states| states.get(&shard_id).copied());
        // The sender lives as long as `self`, so the wait cannot fail
        settled.unwrap_or(ShardState::Disconnected)
    }
}
