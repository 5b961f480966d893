//! Debug notifications - a side channel describing internal transitions

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One internal transition, e.g. a request being requeued or an event dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEvent {
    pub kind: &'static str,
    pub data: Value,
}

impl DebugEvent {
    pub fn new(kind: &'static str, data: Value) -> Self {
        Self { kind, data }
    }
}

/// Optional observer of debug events; never alters control flow
pub type DebugHook = Arc<dyn Fn(DebugEvent) + Send + Sync>;

/// Call the hook when one is installed
#[inline]
pub fn emit_debug(hook: Option<&DebugHook>, kind: &'static str, data: Value) {
    if let Some(hook) = hook {
        hook(DebugEvent::new(kind, data));
    }
}
