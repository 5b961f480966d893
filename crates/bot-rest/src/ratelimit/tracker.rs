//! Rate limit tracker
//!
//! Remembers which URLs and buckets are cooling down, fed by response headers.

use bot_core::{emit_debug, DebugHook};
use dashmap::DashMap;
use reqwest::header::HeaderMap;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Key of the process-wide cooldown
pub const GLOBAL_KEY: &str = "global";

/// Upstream rate limit headers
pub mod header_names {
    pub const REMAINING: &str = "x-ratelimit-remaining";
    pub const RESET: &str = "x-ratelimit-reset";
    pub const RETRY_AFTER: &str = "retry-after";
    pub const GLOBAL: &str = "x-ratelimit-global";
    pub const BUCKET: &str = "x-ratelimit-bucket";
}

/// One active cooldown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub url: String,
    pub reset_at: Instant,
    pub bucket_id: Option<String>,
}

/// Tracks cooldowns keyed by URL, bucket id, or `"global"`
#[derive(Default)]
pub struct RateLimitTracker {
    entries: DashMap<String, RateLimitEntry>,
    globally_limited: AtomicBool,
    debug_hook: Option<DebugHook>,
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("entries", &self.entries.len())
            .field("globally_limited", &self.is_globally_limited())
            .finish()
    }
}

impl RateLimitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_debug_hook(mut self, hook: Option<DebugHook>) -> Self {
        self.debug_hook = hook;
        self
    }

    /// Remaining cooldown for `key`, falling back to the global cooldown
    pub fn check_delay(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.remaining(key, now)
            .or_else(|| self.remaining(GLOBAL_KEY, now))
    }

    fn remaining(&self, key: &str, now: Instant) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| now < entry.reset_at)
            .map(|entry| entry.reset_at - now)
    }

    /// Record a cooldown for a URL, mirrored under its bucket id
    pub fn record_limit(&self, url: &str, reset_at: Instant, bucket_id: Option<&str>) {
        let entry = RateLimitEntry {
            url: url.to_string(),
            reset_at,
            bucket_id: bucket_id.map(str::to_string),
        };
        if let Some(bucket) = bucket_id {
            self.entries.insert(bucket.to_string(), entry.clone());
        }
        self.entries.insert(url.to_string(), entry);

        tracing::debug!(
            url = %url,
            bucket = ?bucket_id,
            reset_in_ms = reset_at.saturating_duration_since(Instant::now()).as_millis() as u64,
            "Rate limit recorded"
        );
    }

    /// Record the global cooldown (and the bucket that triggered it)
    pub fn record_global(&self, reset_at: Instant, bucket_id: Option<&str>) {
        let entry = RateLimitEntry {
            url: GLOBAL_KEY.to_string(),
            reset_at,
            bucket_id: bucket_id.map(str::to_string),
        };
        if let Some(bucket) = bucket_id {
            self.entries.insert(bucket.to_string(), entry.clone());
        }
        self.entries.insert(GLOBAL_KEY.to_string(), entry);
        self.globally_limited.store(true, Ordering::SeqCst);

        let reset_in_ms = reset_at.saturating_duration_since(Instant::now()).as_millis() as u64;
        tracing::warn!(bucket = ?bucket_id, reset_in_ms, "Globally rate limited");
        emit_debug(
            self.debug_hook.as_ref(),
            "globally_rate_limited",
            json!({ "reset_in_ms": reset_in_ms, "bucket_id": bucket_id }),
        );
    }

    /// Whether the global flag is raised and its cooldown still running
    pub fn is_globally_limited(&self) -> bool {
        self.globally_limited.load(Ordering::SeqCst)
            && self.remaining(GLOBAL_KEY, Instant::now()).is_some()
    }

    /// Evict expired entries; clears the global flag once its entry expires
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.reset_at > now);
        if !self.entries.contains_key(GLOBAL_KEY) {
            self.globally_limited.store(false, Ordering::SeqCst);
        }
    }

    /// Run `sweep` every `interval` until the tracker is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let tracker: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match tracker.upgrade() {
                    Some(tracker) => tracker.sweep(),
                    None => break,
                }
            }
        })
    }

    /// Number of tracked keys (URLs, buckets and the global key)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the rate limit headers of a response
    ///
    /// Returns the bucket id when a cooldown was armed.
    pub fn apply_headers(&self, url: &str, headers: &HeaderMap) -> Option<String> {
        self.apply_headers_at(url, headers, chrono::Utc::now().timestamp_millis())
    }

    /// `apply_headers` against an explicit wall clock (epoch milliseconds)
    pub fn apply_headers_at(&self, url: &str, headers: &HeaderMap, now_epoch_ms: i64) -> Option<String> {
        let remaining = header_str(headers, header_names::REMAINING);
        let reset = header_f64(headers, header_names::RESET);
        let retry_after = header_f64(headers, header_names::RETRY_AFTER);
        let global = headers.contains_key(header_names::GLOBAL);
        let bucket_id = header_str(headers, header_names::BUCKET);

        let mut limited = false;
        let now = Instant::now();

        if remaining == Some("0") {
            limited = true;
            // Reset is epoch seconds, possibly fractional
            let reset_in_ms = reset
                .map(|secs| (secs * 1000.0) as i64 - now_epoch_ms)
                .unwrap_or(0)
                .max(0) as u64;
            self.record_limit(url, now + Duration::from_millis(reset_in_ms), bucket_id);
        }

        if global {
            limited = true;
            let retry_ms = retry_after.unwrap_or(0.0).max(0.0) as u64;
            self.record_global(now + Duration::from_millis(retry_ms), bucket_id);
        }

        if limited {
            bucket_id.map(str::to_string)
        } else {
            None
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    header_str(headers, name).and_then(|v| v.parse().ok())
}
