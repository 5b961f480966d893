//! Request queue
//!
//! Per-route FIFO queues drained by a single background task. Each pass
//! sends at most one request per route; routes run concurrently.

use bot_common::{AppError, AppResult};
use bot_core::{emit_debug, DebugHook};
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::ratelimit::RateLimitTracker;
use crate::request::{RequestBuilder, RestRequest};
use crate::transport::{HttpTransport, RawResponse};

/// Body message the upstream sends with a soft rate limit
const RATE_LIMITED_MESSAGE: &str = "You are being rate limited.";

/// Queue settings
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub api_base: String,
    pub max_retries: u32,
    pub drain_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let rest = bot_common::RestConfig::default();
        Self {
            api_base: rest.api_base,
            max_retries: rest.max_retries,
            drain_interval: rest.drain_interval,
        }
    }
}

/// A request waiting in its route queue
struct QueuedRequest {
    request: RestRequest,
    route: String,
    bucket_id: Option<String>,
    retry_count: u32,
    responder: oneshot::Sender<AppResult<Value>>,
}

impl QueuedRequest {
    fn complete(self, result: AppResult<Value>) {
        // The caller may have stopped waiting; the request still ran
        let _ = self.responder.send(result);
    }

    fn describe(&self) -> Value {
        json!({
            "method": self.request.method.as_str(),
            "url": self.request.url,
            "route": self.route,
            "retry_count": self.retry_count,
            "bucket_id": self.bucket_id,
        })
    }
}

/// How a response is handled
enum Outcome {
    Success(Value),
    RateLimited { retry_after_ms: Option<u64> },
    Failed(AppError),
}

struct QueueInner {
    routes: Mutex<HashMap<String, VecDeque<QueuedRequest>>>,
    draining: AtomicBool,
    tracker: Arc<RateLimitTracker>,
    transport: Arc<dyn HttpTransport>,
    builder: RequestBuilder,
    config: QueueConfig,
    debug_hook: Option<DebugHook>,
}

/// Rate-limit aware dispatcher
///
/// Cloning is cheap; all clones share the same queues.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

impl RequestQueue {
    pub fn new(
        config: QueueConfig,
        builder: RequestBuilder,
        transport: Arc<dyn HttpTransport>,
        tracker: Arc<RateLimitTracker>,
        debug_hook: Option<DebugHook>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                routes: Mutex::new(HashMap::new()),
                draining: AtomicBool::new(false),
                tracker,
                transport,
                builder,
                config,
                debug_hook,
            }),
        }
    }

    /// Submit a request and wait for its result
    pub async fn enqueue(&self, request: RestRequest) -> AppResult<Value> {
        let receiver = self.submit(request);
        receiver.await.map_err(|_| AppError::QueueClosed)?
    }

    /// Submit a request; the receiver resolves when it completes
    ///
    /// Submission order is fixed when this returns, so requests on the same
    /// route complete in the order `submit` was called.
    pub fn submit(&self, request: RestRequest) -> oneshot::Receiver<AppResult<Value>> {
        let (responder, receiver) = oneshot::channel();
        let route = route_key(&self.inner.config.api_base, &request.url);
        let queued = QueuedRequest {
            bucket_id: request.bucket_id.clone(),
            request,
            route: route.clone(),
            retry_count: 0,
            responder,
        };

        tracing::debug!(route = %route, url = %queued.request.url, "Request queued");
        emit_debug(self.inner.debug_hook.as_ref(), "request_queued", queued.describe());

        self.inner
            .routes
            .lock()
            .entry(route)
            .or_default()
            .push_back(queued);

        self.ensure_draining();
        receiver
    }

    /// Number of requests waiting across every route
    pub fn pending(&self) -> usize {
        self.inner.routes.lock().values().map(VecDeque::len).sum()
    }

    /// Whether the drain task is running
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    pub fn tracker(&self) -> &Arc<RateLimitTracker> {
        &self.inner.tracker
    }

    pub fn api_base(&self) -> &str {
        &self.inner.config.api_base
    }

    fn ensure_draining(&self) {
        if !self.inner.draining.swap(true, Ordering::SeqCst) {
            tokio::spawn(Arc::clone(&self.inner).drain());
        }
    }
}

impl QueueInner {
    async fn drain(self: Arc<Self>) {
        tracing::trace!("Request queue drain started");
        loop {
            if self.tracker.is_globally_limited() {
                tracing::debug!("Drain pass skipped, global cooldown active");
            } else {
                let heads: Vec<QueuedRequest> = {
                    let mut routes = self.routes.lock();
                    routes.values_mut().filter_map(VecDeque::pop_front).collect()
                };
                join_all(heads.into_iter().map(|queued| self.process(queued))).await;
            }

            let idle = {
                let mut routes = self.routes.lock();
                routes.retain(|_, queue| !queue.is_empty());
                routes.is_empty()
            };

            if idle {
                self.draining.store(false, Ordering::SeqCst);
                // A submit may have slipped in after the idle check
                if self.routes.lock().is_empty() || self.draining.swap(true, Ordering::SeqCst) {
                    break;
                }
                continue;
            }

            tokio::time::sleep(self.config.drain_interval).await;
        }
        tracing::trace!("Request queue drain idle");
    }

    /// Cooldown blocking this request (its URL, its bucket, or global)
    fn blocked_for(&self, queued: &QueuedRequest) -> Option<Duration> {
        let by_url = self.tracker.check_delay(&queued.request.url);
        let by_bucket = queued
            .bucket_id
            .as_deref()
            .and_then(|bucket| self.tracker.check_delay(bucket));
        by_url.max(by_bucket)
    }

    fn requeue_front(&self, queued: QueuedRequest) {
        self.routes
            .lock()
            .entry(queued.route.clone())
            .or_default()
            .push_front(queued);
    }

    async fn process(&self, mut queued: QueuedRequest) {
        let hook = self.debug_hook.as_ref();

        if let Some(wait) = self.blocked_for(&queued) {
            tracing::debug!(
                route = %queued.route,
                url = %queued.request.url,
                wait_ms = wait.as_millis() as u64,
                "Request deferred by cooldown"
            );
            emit_debug(hook, "request_deferred", queued.describe());
            self.requeue_front(queued);
            return;
        }

        let prepared = match self.builder.prepare(&queued.request) {
            Ok(prepared) => prepared,
            Err(err) => {
                emit_debug(hook, "request_failed", json!({ "request": queued.describe(), "error": err.to_string() }));
                queued.complete(Err(err));
                return;
            }
        };

        emit_debug(hook, "request_fetching", queued.describe());
        let response = match self.transport.execute(prepared).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url = %queued.request.url, error = %err, "Request transport failed");
                emit_debug(hook, "request_failed", json!({ "request": queued.describe(), "error": err.to_string() }));
                queued.complete(Err(err));
                return;
            }
        };
        emit_debug(
            hook,
            "request_fetched",
            json!({ "request": queued.describe(), "status": response.status }),
        );

        let header_bucket = self.tracker.apply_headers(&queued.request.url, &response.headers);

        match classify(&response) {
            Outcome::Success(value) => {
                tracing::debug!(url = %queued.request.url, status = response.status, "Request succeeded");
                emit_debug(hook, "request_success", queued.describe());
                queued.complete(Ok(value));
            }
            Outcome::RateLimited { retry_after_ms } => {
                if queued.retry_count >= self.config.max_retries {
                    tracing::warn!(
                        url = %queued.request.url,
                        retries = queued.retry_count,
                        "Rate limit retries exhausted"
                    );
                    emit_debug(hook, "request_retries_exhausted", queued.describe());
                    let err = AppError::RateLimitExceeded {
                        url: queued.request.url.clone(),
                        retries: queued.retry_count,
                    };
                    queued.complete(Err(err));
                    return;
                }

                queued.retry_count += 1;
                if header_bucket.is_some() {
                    queued.bucket_id = header_bucket;
                }
                if let Some(ms) = retry_after_ms.filter(|&ms| ms > 0) {
                    if self.tracker.check_delay(&queued.request.url).is_none() {
                        self.tracker.record_limit(
                            &queued.request.url,
                            Instant::now() + Duration::from_millis(ms),
                            queued.bucket_id.as_deref(),
                        );
                    }
                }

                tracing::debug!(
                    url = %queued.request.url,
                    retry_count = queued.retry_count,
                    bucket = ?queued.bucket_id,
                    "Request rate limited, requeued"
                );
                emit_debug(hook, "request_rate_limited", queued.describe());
                self.requeue_front(queued);
            }
            Outcome::Failed(err) => {
                tracing::warn!(url = %queued.request.url, status = response.status, error = %err, "Request failed");
                emit_debug(
                    hook,
                    "request_failed",
                    json!({ "request": queued.describe(), "error": err.to_string() }),
                );
                queued.complete(Err(err));
            }
        }
    }
}

/// Classify a response as success, soft/hard rate limit or failure
fn classify(response: &RawResponse) -> Outcome {
    let body = response.body.trim();
    let parsed: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_str(body).ok()
    };

    if response.status == 429 || parsed.as_ref().is_some_and(is_rate_limit_body) {
        let retry_after_ms = parsed
            .as_ref()
            .and_then(|v| v.get("retry_after"))
            .and_then(Value::as_f64)
            .map(|ms| ms.max(0.0) as u64);
        return Outcome::RateLimited { retry_after_ms };
    }

    match response.status {
        204 => Outcome::Success(Value::Null),
        200..=299 => {
            if body.is_empty() {
                Outcome::Success(Value::Null)
            } else {
                match parsed {
                    Some(value) => Outcome::Success(value),
                    None => Outcome::Failed(AppError::Decode(format!(
                        "response body is not JSON ({} bytes)",
                        body.len()
                    ))),
                }
            }
        }
        status @ 400..=499 => Outcome::Failed(AppError::ClientError {
            status,
            message: error_message(parsed.as_ref(), body),
        }),
        status @ 500..=599 => Outcome::Failed(AppError::ServerError {
            status,
            message: error_message(parsed.as_ref(), body),
        }),
        status => Outcome::Failed(AppError::UnknownError { status }),
    }
}

fn is_rate_limit_body(value: &Value) -> bool {
    let retry_after = value
        .get("retry_after")
        .is_some_and(|v| !v.is_null() && v.as_f64() != Some(0.0));
    let message = value.get("message").and_then(Value::as_str) == Some(RATE_LIMITED_MESSAGE);
    retry_after || message
}

fn error_message(parsed: Option<&Value>, raw: &str) -> String {
    parsed
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| raw.to_string(), str::to_string)
}

/// First path segment after the API base: `/channels/1/messages` -> `channels`
pub fn route_key(api_base: &str, url: &str) -> String {
    let path = url.strip_prefix(api_base).unwrap_or(url);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
