//! Per-route and global rate limit bookkeeping

mod tracker;

pub use tracker::{header_names, RateLimitEntry, RateLimitTracker, GLOBAL_KEY};
