//! Events raised inside the domain layer

mod debug_event;

pub use debug_event::{emit_debug, DebugEvent, DebugHook};
