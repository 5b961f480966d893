//! Integration test utilities for the bot runtime
//!
//! This crate provides scripted transports and fixtures for running
//! end-to-end scenarios across the REST queue, the shard router and the
//! command services without a network.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
