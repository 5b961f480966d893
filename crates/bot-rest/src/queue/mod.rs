//! Per-route request queue and its drain task

mod request_queue;

pub use request_queue::{route_key, QueueConfig, RequestQueue};
