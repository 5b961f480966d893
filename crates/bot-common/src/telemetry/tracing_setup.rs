//! Tracing and logging setup
//!
//! One `EnvFilter` + fmt layer. Without `RUST_LOG` the filter is built from
//! the base level, the HTTP stack pinned to `warn`, and optional debug
//! directives for the REST queue and the gateway router.

use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::Environment;

/// HTTP client internals, loud at debug level
const HTTP_STACK_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Target logging queue transitions and cooldowns
const REST_QUEUE_TARGET: &str = "bot_rest";

/// Target logging every dispatch, including dropped ones
const GATEWAY_ROUTER_TARGET: &str = "bot_gateway::router";

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Base level for everything not named below
    pub level: Level,
    /// Log request queue transitions at debug
    pub rest_debug: bool,
    /// Log gateway dispatches at debug
    pub gateway_debug: bool,
    pub json: bool,
    /// Include span open/close events
    pub span_events: bool,
    pub file_line: bool,
    /// Route output through the test harness capture
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            rest_debug: false,
            gateway_debug: false,
            json: false,
            span_events: false,
            file_line: true,
            test_writer: false,
        }
    }
}

impl TracingConfig {
    /// Debug logging for the REST queue and the router
    #[must_use]
    pub fn development() -> Self {
        Self {
            rest_debug: true,
            gateway_debug: true,
            span_events: true,
            ..Self::default()
        }
    }

    /// JSON lines at info
    #[must_use]
    pub fn production() -> Self {
        Self {
            json: true,
            file_line: false,
            ..Self::default()
        }
    }

    /// Warnings only, captured per test
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: Level::WARN,
            file_line: false,
            test_writer: true,
            ..Self::default()
        }
    }

    /// Preset matching the deployment environment
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        if env.is_production() {
            Self::production()
        } else if env.is_development() {
            Self::development()
        } else {
            Self::default()
        }
    }

    /// Filter directives used when `RUST_LOG` is unset
    pub fn directives(&self) -> Vec<String> {
        let base = self.level.to_string().to_lowercase();
        let mut directives = vec![base];
        directives.extend(HTTP_STACK_TARGETS.iter().map(|target| format!("{target}=warn")));
        if self.rest_debug {
            directives.push(format!("{REST_QUEUE_TARGET}=debug"));
        }
        if self.gateway_debug {
            directives.push(format!("{GATEWAY_ROUTER_TARGET}=debug"));
        }
        directives
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives().join(",")))
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_span_events(span_events);

        match (self.json, self.test_writer) {
            (true, true) => layer.json().with_test_writer().boxed(),
            (true, false) => layer.json().boxed(),
            (false, true) => layer.with_test_writer().boxed(),
            (false, false) => layer.boxed(),
        }
    }
}

/// Initialize the tracing subscriber with the default configuration
///
/// # Panics
/// Panics if a global subscriber is already set.
pub fn init_tracing() {
    init_tracing_with_config(&TracingConfig::default());
}

/// Initialize the tracing subscriber with a custom configuration
///
/// # Panics
/// Panics if a global subscriber is already set.
pub fn init_tracing_with_config(config: &TracingConfig) {
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer())
        .init();
}

/// Initialize tracing unless a subscriber is already installed
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(&TracingConfig::default())
}

/// Initialize tracing with a custom configuration unless a subscriber is already installed
pub fn try_init_tracing_with_config(config: &TracingConfig) -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer())
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
