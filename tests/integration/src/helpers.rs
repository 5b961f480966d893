//! Test helpers for integration tests
//!
//! Provides a scripted HTTP transport, an in-memory gateway and an event
//! recorder that can wait for the router to catch up.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bot_common::{try_init_tracing_with_config, AppConfig, AppResult, TracingConfig};
use bot_gateway::{
    BotClient, BotEvent, EventHandlers, EventKind, GatewayError, GatewayMessage, GatewayResult, IdentifyPayload,
    ShardConnection, ShardConnector,
};
use bot_rest::{HttpTransport, PreparedRequest, RawResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::fixtures;

/// Base URL every test client talks to
pub const API_BASE: &str = "https://api.test/v6";

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    test_config_with(&[])
}

/// Test configuration with some variables overridden
pub fn test_config_with(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let defaults = [
        ("BOT_TOKEN", "test-token"),
        ("REST_API_BASE", API_BASE),
        ("GATEWAY_SHARD_COOLDOWN_MS", "5000"),
    ];
    AppConfig::from_lookup(|key| {
        overrides
            .iter()
            .chain(defaults.iter())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

// ============================================================================
// HTTP
// ============================================================================

/// One request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub audit_reason: Option<String>,
    pub body: Option<Value>,
}

/// Scripted transport: per-path responses first, then the shared FIFO,
/// then `204 No Content`
#[derive(Default)]
pub struct MockTransport {
    routed: Mutex<Vec<(String, VecDeque<RawResponse>)>>,
    responses: Mutex<VecDeque<RawResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON response for the next request without a routed response
    pub fn respond(&self, status: u16, body: Value) {
        self.push(RawResponse::new(status, body.to_string()));
    }

    pub fn push(&self, response: RawResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Queue a response for the next request whose URL ends with `path`
    pub fn respond_to(&self, path: &str, status: u16, body: Value) {
        let response = RawResponse::new(status, body.to_string());
        let mut routed = lock(&self.routed);
        match routed.iter_mut().find(|(p, _)| p == path) {
            Some((_, queue)) => queue.push_back(response),
            None => routed.push((path.to_string(), VecDeque::from([response]))),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn urls(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.url.clone()).collect()
    }

    /// Calls whose URL ends with `path`
    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.url.ends_with(path))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: PreparedRequest) -> AppResult<RawResponse> {
        lock(&self.calls).push(Call {
            at: Instant::now(),
            method: request.method.to_string(),
            url: request.url.clone(),
            authorization: request.header("authorization").map(str::to_string),
            audit_reason: request.header("x-audit-log-reason").map(str::to_string),
            body: request.json_body(),
        });

        let routed = lock(&self.routed)
            .iter_mut()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .and_then(|(_, queue)| queue.pop_front());
        let response = routed
            .or_else(|| lock(&self.responses).pop_front())
            .unwrap_or_else(|| RawResponse::new(204, ""));
        Ok(response)
    }
}

/// A response carrying rate limit headers
pub fn limited_response(status: u16, body: Value, headers: &[(&'static str, String)]) -> RawResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let Ok(value) = HeaderValue::from_str(value) {
            map.insert(HeaderName::from_static(name), value);
        }
    }
    RawResponse {
        status,
        headers: map,
        body: body.to_string(),
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Server side of one in-memory shard
pub struct ShardEnd {
    pub identify: IdentifyPayload,
    pub connected_at: Instant,
    to_client: mpsc::Sender<GatewayMessage>,
    from_client: mpsc::Receiver<GatewayMessage>,
}

/// In-memory gateway; every shard is greeted with READY for `bot_id`
pub struct MemoryGateway {
    bot_id: u64,
    shards: Mutex<Vec<ShardEnd>>,
    sequence: AtomicU64,
}

impl MemoryGateway {
    pub fn new(bot_id: u64) -> Arc<Self> {
        Arc::new(Self {
            bot_id,
            shards: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn shard_count(&self) -> usize {
        lock(&self.shards).len()
    }

    pub fn identifies(&self) -> Vec<IdentifyPayload> {
        lock(&self.shards).iter().map(|s| s.identify.clone()).collect()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        lock(&self.shards).iter().map(|s| s.connected_at).collect()
    }

    /// Push a dispatch frame to a shard
    pub async fn dispatch(&self, shard_id: usize, event: &str, data: Value) -> Result<()> {
        let sender = lock(&self.shards)
            .get(shard_id)
            .map(|s| s.to_client.clone())
            .context("unknown shard")?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        sender
            .send(GatewayMessage::dispatch(event, sequence, data))
            .await
            .context("shard closed")
    }

    /// Frames the client sent to a shard so far
    pub fn sent_frames(&self, shard_id: usize) -> Vec<GatewayMessage> {
        let mut shards = lock(&self.shards);
        let mut frames = Vec::new();
        if let Some(shard) = shards.get_mut(shard_id) {
            while let Ok(frame) = shard.from_client.try_recv() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Send a marker through the shard and return every event the router
    /// emitted before it
    pub async fn flush(&self, shard_id: usize, recorder: &mut EventRecorder) -> Result<Vec<BotEvent>> {
        let marker = self.sequence.load(Ordering::SeqCst) + 1_000_000;
        self.dispatch(shard_id, "TYPING_START", json!({ "marker": marker })).await?;
        recorder.until_marker(marker).await
    }
}

#[async_trait]
impl ShardConnector for MemoryGateway {
    async fn connect(&self, _gateway_url: &str, identify: IdentifyPayload) -> GatewayResult<ShardConnection> {
        let (to_client, incoming) = mpsc::channel(256);
        let (outgoing, from_client) = mpsc::channel(256);

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        to_client
            .send(GatewayMessage::dispatch("READY", sequence, fixtures::ready(self.bot_id)))
            .await
            .map_err(|_| GatewayError::connector("client side closed"))?;

        lock(&self.shards).push(ShardEnd {
            identify,
            connected_at: Instant::now(),
            to_client,
            from_client,
        });
        Ok(ShardConnection::new(incoming, outgoing))
    }
}

// ============================================================================
// Events
// ============================================================================

/// Collects emitted events; TYPING_START doubles as a flush marker
pub struct EventRecorder {
    tx: mpsc::UnboundedSender<BotEvent>,
    rx: mpsc::UnboundedReceiver<BotEvent>,
}

impl Default for EventRecorder {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl EventRecorder {
    /// Handlers recording the given kinds
    pub fn handlers(&self, kinds: &[EventKind]) -> EventHandlers {
        let mut handlers = EventHandlers::new();
        for kind in kinds.iter().copied().chain([EventKind::TypingStart]) {
            let tx = self.tx.clone();
            handlers = handlers.on(kind, move |event| {
                let _ = tx.send(event.clone());
            });
        }
        handlers
    }

    async fn until_marker(&mut self, marker: u64) -> Result<Vec<BotEvent>> {
        let mut events = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(30), self.rx.recv())
                .await
                .context("timed out waiting for the router")?
                .context("recorder closed")?;
            match event {
                BotEvent::TypingStart(data) if data["marker"] == marker => return Ok(events),
                BotEvent::TypingStart(_) => {}
                other => events.push(other),
            }
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// A connected client with its scripted collaborators
pub struct TestBot {
    pub client: BotClient,
    pub transport: Arc<MockTransport>,
    pub gateway: Arc<MemoryGateway>,
}

impl TestBot {
    /// Stream the scenario guild in on shard 0 and wait for it to be cached
    pub async fn seed_guild(&self, recorder: &mut EventRecorder) -> Result<Vec<BotEvent>> {
        self.gateway.dispatch(0, "GUILD_CREATE", fixtures::guild_create()).await?;
        self.gateway.flush(0, recorder).await
    }
}

/// Connect a client over `shards` in-memory shards
pub async fn connect_bot(shards: u32, handlers: EventHandlers) -> Result<TestBot> {
    connect_bot_with(&test_config()?, shards, handlers).await
}

/// Connect with an explicit configuration; `shards` is what the gateway recommends
pub async fn connect_bot_with(config: &AppConfig, shards: u32, handlers: EventHandlers) -> Result<TestBot> {
    // Another test in this binary may have installed it already
    let _ = try_init_tracing_with_config(&TracingConfig::test());

    let transport = MockTransport::new();
    transport.respond_to("/gateway/bot", 200, fixtures::gateway_bot(shards));
    let gateway = MemoryGateway::new(fixtures::BOT);

    let client = BotClient::connect(
        config,
        Arc::clone(&transport) as Arc<dyn HttpTransport>,
        Arc::clone(&gateway) as Arc<dyn ShardConnector>,
        handlers,
    )
    .await?;

    Ok(TestBot {
        client,
        transport,
        gateway,
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
