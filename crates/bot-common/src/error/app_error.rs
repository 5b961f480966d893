//! Application error types
//!
//! Unified error handling for the entire runtime.

use bot_core::DomainError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Upstream HTTP failures
    #[error("Request failed with status {status}: {message}")]
    ClientError { status: u16, message: String },

    #[error("Upstream server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Rate limit retries exhausted for {url} after {retries} attempts")]
    RateLimitExceeded { url: String, retries: u32 },

    #[error("Unexpected response status {status}")]
    UnknownError { status: u16 },

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Transport and decoding
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request queue closed")]
    QueueClosed,

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP-style status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ClientError { status, .. }
            | Self::ServerError { status, .. }
            | Self::UnknownError { status } => *status,

            // 400 Bad Request
            Self::Validation(_) | Self::Decode(_) => 400,

            // 429 Too Many Requests
            Self::RateLimitExceeded { .. } => 429,

            // 502 Bad Gateway
            Self::Transport(_) => 502,

            // 500 Internal Server Error
            Self::QueueClosed | Self::Internal(_) | Self::Config(_) => 500,

            // Map domain errors to appropriate status codes
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_authorization() {
                    403
                } else if e.is_validation() {
                    400
                } else {
                    500
                }
            }
        }
    }

    /// Stable error code for logs and callers
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ClientError { .. } => "CLIENT_ERROR",
            Self::ServerError { .. } => "SERVER_ERROR",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::UnknownError { .. } => "UNKNOWN_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::QueueClosed => "QUEUE_CLOSED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        let status = self.status_code();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        let status = self.status_code();
        (500..600).contains(&status)
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
