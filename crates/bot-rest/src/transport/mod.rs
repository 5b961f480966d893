//! HTTP transport seam
//!
//! The queue only talks to [`HttpTransport`]; production code plugs in
//! [`ReqwestTransport`], tests plug in scripted fakes.

mod reqwest_transport;

use async_trait::async_trait;
use bot_common::AppResult;
use reqwest::header::HeaderMap;

use crate::request::PreparedRequest;

pub use reqwest_transport::ReqwestTransport;

/// Status, headers and body text of a response
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one prepared request
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: PreparedRequest) -> AppResult<RawResponse>;
}
