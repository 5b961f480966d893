//! # bot-rest
//!
//! REST control plane: rate limit tracking, the per-route request queue,
//! request building and the HTTP transport.

pub mod client;
pub mod endpoints;
pub mod queue;
pub mod ratelimit;
pub mod request;
pub mod transport;

pub use client::{decode, RestClient};
pub use queue::{route_key, QueueConfig, RequestQueue};
pub use ratelimit::{RateLimitEntry, RateLimitTracker, GLOBAL_KEY};
pub use request::{FileAttachment, PreparedBody, PreparedRequest, RequestBuilder, RestRequest, AUDIT_LOG_REASON};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};
