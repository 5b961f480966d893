//! `reqwest`-backed transport

use async_trait::async_trait;
use bot_common::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use super::{HttpTransport, RawResponse};
use crate::request::{PreparedBody, PreparedRequest};

/// Sends requests with a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: PreparedRequest) -> AppResult<RawResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            PreparedBody::Empty => builder,
            PreparedBody::Json(text) => builder.body(text),
            PreparedBody::Multipart { file, payload_json } => {
                let form = Form::new()
                    .part("file", Part::bytes(file.data).file_name(file.name))
                    .text("payload_json", payload_json);
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
