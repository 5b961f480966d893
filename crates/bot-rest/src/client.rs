//! REST client
//!
//! Owns the request queue and the rate limit tracker (plus its sweeper task)
//! and exposes verb helpers taking paths relative to the API base.

use bot_common::{AppConfig, AppError, AppResult, RestConfig};
use bot_core::DebugHook;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::queue::{QueueConfig, RequestQueue};
use crate::ratelimit::RateLimitTracker;
use crate::request::{FileAttachment, RequestBuilder, RestRequest};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Rate-limited REST client
///
/// Must be created inside a tokio runtime; the tracker sweeper is spawned
/// immediately and aborted when the client is dropped.
pub struct RestClient {
    queue: RequestQueue,
    tracker: Arc<RateLimitTracker>,
    sweeper: JoinHandle<()>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("api_base", &self.queue.api_base())
            .field("pending", &self.queue.pending())
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl RestClient {
    pub fn new(config: &RestConfig, token: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_debug_hook(config, token, transport, None)
    }

    pub fn with_debug_hook(
        config: &RestConfig,
        token: &str,
        transport: Arc<dyn HttpTransport>,
        debug_hook: Option<DebugHook>,
    ) -> Self {
        let tracker = Arc::new(RateLimitTracker::new().with_debug_hook(debug_hook.clone()));
        let sweeper = tracker.spawn_sweeper(config.sweep_interval);
        let queue = RequestQueue::new(
            QueueConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                max_retries: config.max_retries,
                drain_interval: config.drain_interval,
            },
            RequestBuilder::new(token),
            transport,
            Arc::clone(&tracker),
            debug_hook,
        );

        tracing::info!(api_base = %config.api_base, max_retries = config.max_retries, "REST client ready");

        Self {
            queue,
            tracker,
            sweeper,
        }
    }

    /// Client backed by `reqwest`, configured from the environment config
    pub fn from_config(config: &AppConfig, debug_hook: Option<DebugHook>) -> AppResult<Self> {
        let transport = ReqwestTransport::new(config.rest.timeout)?;
        Ok(Self::with_debug_hook(
            &config.rest,
            &config.bot.token,
            Arc::new(transport),
            debug_hook,
        ))
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn tracker(&self) -> &Arc<RateLimitTracker> {
        &self.tracker
    }

    /// Absolute URL for a path relative to the API base
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.queue.api_base(), path.trim_start_matches('/'))
        }
    }

    /// Submit a fully described request
    pub async fn request(&self, request: RestRequest) -> AppResult<Value> {
        self.queue.enqueue(request).await
    }

    /// GET with the optional object sent as the query string
    pub async fn get(&self, path: &str, query: Option<Value>) -> AppResult<Value> {
        self.request(with_body(RestRequest::get(self.url(path)), query))
            .await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> AppResult<Value> {
        self.request(with_body(RestRequest::post(self.url(path)), body))
            .await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> AppResult<Value> {
        self.request(with_body(RestRequest::put(self.url(path)), body))
            .await
    }

    pub async fn patch(&self, path: &str, body: Option<Value>) -> AppResult<Value> {
        self.request(with_body(RestRequest::patch(self.url(path)), body))
            .await
    }

    pub async fn delete(&self, path: &str, body: Option<Value>) -> AppResult<Value> {
        self.request(with_body(RestRequest::delete(self.url(path)), body))
            .await
    }

    /// POST a file with the JSON body as `payload_json`
    pub async fn post_file(&self, path: &str, body: Option<Value>, file: FileAttachment) -> AppResult<Value> {
        let request = with_body(RestRequest::post(self.url(path)), body).with_file(file);
        self.request(request).await
    }
}

impl Drop for RestClient {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

fn with_body(request: RestRequest, body: Option<Value>) -> RestRequest {
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}

/// Deserialize a response value into a typed record
pub fn decode<T: DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Decode(e.to_string()))
}
