//! Shard manager
//!
//! Opens shards one after another, funnels their frames into the router task
//! and fans outbound commands back out to the shards.

use super::{MemberChunkRegistry, ShardConnection, ShardConnector, ShardState, ShardStates};
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{
    Activity, GatewayMessage, IdentifyPayload, RequestGuildMembersPayload, StatusType, StatusUpdatePayload,
};
use crate::router::ShardRouter;
use bot_cache::EntityCache;
use bot_core::Snowflake;
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Static settings of one sharded session
#[derive(Debug, Clone)]
pub struct ShardSettings {
    pub gateway_url: String,
    /// Identify template; its shard pair is rewritten per shard
    pub identify: IdentifyPayload,
    /// Wait after one shard's READY before the next shard connects
    pub cooldown: Duration,
    /// Capacity of the shard-to-router frame channel
    pub frame_buffer: usize,
}

pub struct ShardManager {
    connector: Arc<dyn ShardConnector>,
    settings: ShardSettings,
    cache: Arc<EntityCache>,
    states: Arc<ShardStates>,
    chunks: Arc<MemberChunkRegistry>,
    /// Outbound frame sender per shard
    senders: DashMap<u32, mpsc::Sender<GatewayMessage>>,
    /// Taken by the router task on start
    router: Mutex<Option<ShardRouter>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ShardManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardManager")
            .field("settings", &self.settings)
            .field("connected", &self.senders.len())
            .finish_non_exhaustive()
    }
}

impl ShardManager {
    /// The manager shares the router's cache, shard states and chunk registry
    pub fn new(router: ShardRouter, connector: Arc<dyn ShardConnector>, settings: ShardSettings) -> Self {
        Self {
            connector,
            settings,
            cache: Arc::clone(router.cache()),
            states: Arc::clone(router.states()),
            chunks: Arc::clone(router.chunks()),
            senders: DashMap::new(),
            router: Mutex::new(Some(router)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn shard_count(&self) -> u32 {
        self.settings.identify.shard_count()
    }

    pub fn shard_state(&self, shard_id: u32) -> Option<ShardState> {
        self.states.get(shard_id)
    }

    pub fn states(&self) -> &Arc<ShardStates> {
        &self.states
    }

    pub fn chunks(&self) -> &Arc<MemberChunkRegistry> {
        &self.chunks
    }

    /// Start the router task and bring every shard up in order
    ///
    /// Shard `n + 1` connects only after shard `n` received READY and the
    /// cool-down elapsed. A shard whose stream ends before READY aborts the
    /// bootstrap.
    pub async fn start(&self) -> GatewayResult<()> {
        let router = self.router.lock().take().ok_or(GatewayError::AlreadyStarted)?;
        let (frame_tx, mut frame_rx) = mpsc::channel::<(u32, GatewayMessage)>(self.settings.frame_buffer.max(1));

        let router_task = tokio::spawn(async move {
            while let Some((shard_id, frame)) = frame_rx.recv().await {
                router.handle_frame(shard_id, frame);
            }
            tracing::debug!("Router task finished");
        });
        self.tasks.lock().push(router_task);

        let shard_count = self.shard_count();
        tracing::info!(shard_count, url = %self.settings.gateway_url, "Starting shards");

        for shard_id in 0..shard_count {
            self.spawn_shard(shard_id, &frame_tx).await?;

            if self.states.wait_settled(shard_id).await == ShardState::Disconnected {
                tracing::error!(shard_id, "Shard disconnected before READY");
                return Err(GatewayError::Disconnected(shard_id));
            }
            if shard_id + 1 < shard_count {
                tokio::time::sleep(self.settings.cooldown).await;
            }
        }

        tracing::info!(shard_count, "All shards identified");
        Ok(())
    }

    async fn spawn_shard(&self, shard_id: u32, frames: &mpsc::Sender<(u32, GatewayMessage)>) -> GatewayResult<()> {
        let identify = self.settings.identify.for_shard(shard_id);
        let ShardConnection { mut incoming, outgoing } =
            self.connector.connect(&self.settings.gateway_url, identify).await?;

        self.senders.insert(shard_id, outgoing);
        self.states.set(shard_id, ShardState::AwaitingIdentify);

        let frames = frames.clone();
        let states = Arc::clone(&self.states);
        let handle = tokio::spawn(async move {
            while let Some(frame) = incoming.recv().await {
                if frames.send((shard_id, frame)).await.is_err() {
                    break;
                }
            }
            states.set(shard_id, ShardState::Disconnected);
            tracing::warn!(shard_id, "Shard frame stream ended");
        });
        self.tasks.lock().push(handle);

        tracing::debug!(shard_id, "Shard connected");
        Ok(())
    }

    /// Send one frame to one shard
    pub async fn send(&self, shard_id: u32, frame: GatewayMessage) -> GatewayResult<()> {
        // Clone out of the map so no shard lock is held across the await
        let sender = self
            .senders
            .get(&shard_id)
            .map(|s| s.clone())
            .ok_or(GatewayError::ShardNotFound(shard_id))?;
        sender
            .send(frame)
            .await
            .map_err(|_| GatewayError::ChannelClosed(shard_id))
    }

    /// Send one frame to every shard, returning how many accepted it
    pub async fn send_gateway_command(&self, frame: GatewayMessage) -> usize {
        let senders: Vec<_> = self
            .senders
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let results = join_all(senders.into_iter().map(|(shard_id, sender)| {
            let frame = frame.clone();
            async move {
                let sent = sender.send(frame).await.is_ok();
                if !sent {
                    tracing::warn!(shard_id, "Shard closed, command not delivered");
                }
                sent
            }
        }))
        .await;

        results.into_iter().filter(|sent| *sent).count()
    }

    /// Broadcast a status update to every shard
    pub async fn edit_bot_status(&self, status: StatusType, activity: Option<Activity>) -> usize {
        let payload = StatusUpdatePayload::new(status, activity);
        self.send_gateway_command(GatewayMessage::status_update(&payload)).await
    }

    /// Ask the guild's shard for every member
    ///
    /// The receiver completes once the last chunk has been applied to the
    /// cache.
    pub async fn request_all_members(&self, guild_id: Snowflake) -> GatewayResult<oneshot::Receiver<()>> {
        let shard_id = self
            .cache
            .with_guild(guild_id, |guild| guild.shard_id)
            .ok_or(GatewayError::GuildNotCached(guild_id))?;

        let (nonce, rx) = self.chunks.register();
        let frame = GatewayMessage::request_guild_members(&RequestGuildMembersPayload::all(guild_id, nonce.clone()));

        if let Err(e) = self.send(shard_id, frame).await {
            self.chunks.cancel(&nonce);
            return Err(e);
        }
        tracing::debug!(guild_id = %guild_id, shard_id, nonce = %nonce, "Requested guild members");
        Ok(rx)
    }

    /// Stop every shard and the router task
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.senders.clear();
        tracing::info!("Shard manager shut down");
    }
}

impl Drop for ShardManager {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
