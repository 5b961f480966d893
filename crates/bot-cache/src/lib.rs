//! # bot-cache
//!
//! In-memory entity store fed by gateway events.
//!
//! Features:
//! - Guild, channel and message maps keyed by snowflake
//! - Members, roles, emojis and voice states nested in their guild
//! - Unavailable guild tracking and the bot's own user id

pub mod store;

pub use store::EntityCache;
