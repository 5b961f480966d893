//! Pending bulk member requests, keyed by nonce

use dashmap::DashMap;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct MemberChunkRegistry {
    pending: DashMap<String, oneshot::Sender<()>>,
}

impl MemberChunkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request under a fresh nonce
    ///
    /// The receiver completes once the final chunk for the nonce arrives.
    pub fn register(&self) -> (String, oneshot::Receiver<()>) {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(nonce.clone(), tx);
        tracing::debug!(nonce = %nonce, "Member request registered");
        (nonce, rx)
    }

    /// Complete and forget a request; false when the nonce is unknown
    pub fn complete(&self, nonce: &str) -> bool {
        match self.pending.remove(nonce) {
            Some((_, tx)) => {
                // The caller may have stopped waiting
                let _ = tx.send(());
                tracing::debug!(nonce = %nonce, "Member request completed");
                true
            }
            None => false,
        }
    }

    /// Forget a request without completing it
    pub fn cancel(&self, nonce: &str) -> bool {
        self.pending.remove(nonce).is_some()
    }

    pub fn is_pending(&self, nonce: &str) -> bool {
        self.pending.contains_key(nonce)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
