//! Event handler registry
//!
//! A capability map from [`EventKind`] to callback. Slots left empty are
//! no-ops, so a bot only pays for the events it listens to.

use super::{BotEvent, EventKind};
use crate::protocol::GatewayMessage;
use bot_core::{emit_debug, DebugHook};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type EventCallback = Arc<dyn Fn(&BotEvent) + Send + Sync>;

/// Receives every frame before routing, with the shard it came from
pub type RawCallback = Arc<dyn Fn(u32, &GatewayMessage) + Send + Sync>;

/// Receives the shard id of every heartbeat acknowledgement
pub type HeartbeatCallback = Arc<dyn Fn(u32) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventHandlers {
    events: HashMap<EventKind, EventCallback>,
    raw: Option<RawCallback>,
    heartbeat: Option<HeartbeatCallback>,
    debug: Option<DebugHook>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.events.keys().map(|k| format!("{k:?}")).collect();
        kinds.sort();
        f.debug_struct("EventHandlers")
            .field("events", &kinds)
            .field("raw", &self.raw.is_some())
            .field("heartbeat", &self.heartbeat.is_some())
            .field("debug", &self.debug.is_some())
            .finish()
    }
}

impl EventHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler of one event kind, replacing any previous one
    #[must_use]
    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&BotEvent) + Send + Sync + 'static,
    {
        self.events.insert(kind, Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_raw<F>(mut self, handler: F) -> Self
    where
        F: Fn(u32, &GatewayMessage) + Send + Sync + 'static,
    {
        self.raw = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_heartbeat<F>(mut self, handler: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.heartbeat = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_debug(mut self, hook: DebugHook) -> Self {
        self.debug = Some(hook);
        self
    }

    pub fn has(&self, kind: EventKind) -> bool {
        self.events.contains_key(&kind)
    }

    pub fn debug_hook(&self) -> Option<&DebugHook> {
        self.debug.as_ref()
    }

    /// Deliver an event to its slot
    pub fn emit(&self, event: &BotEvent) {
        if let Some(handler) = self.events.get(&event.kind()) {
            handler(event);
        }
    }

    pub fn emit_raw(&self, shard_id: u32, frame: &GatewayMessage) {
        if let Some(handler) = &self.raw {
            handler(shard_id, frame);
        }
    }

    pub fn emit_heartbeat(&self, shard_id: u32) {
        if let Some(handler) = &self.heartbeat {
            handler(shard_id);
        }
    }

    pub fn emit_debug(&self, kind: &'static str, data: Value) {
        emit_debug(self.debug.as_ref(), kind, data);
    }
}
