//! Request building
//!
//! Turns a [`RestRequest`] into headers, final URL and body.

use bot_common::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde_json::{json, Value};
use url::form_urlencoded;

use super::{FileAttachment, RestRequest};

/// Header carrying the (percent-encoded) audit log reason
pub const AUDIT_LOG_REASON: &str = "x-audit-log-reason";

const DEFAULT_USER_AGENT: &str = concat!("DiscordBot (bot-runtime, ", env!("CARGO_PKG_VERSION"), ")");

/// Body as it goes on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedBody {
    Empty,
    Json(String),
    /// `file` part plus the JSON body in a `payload_json` part
    Multipart {
        file: FileAttachment,
        payload_json: String,
    },
}

/// Fully built request handed to an [`HttpTransport`](crate::HttpTransport)
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: PreparedBody,
}

impl PreparedRequest {
    /// Parsed JSON body (the `payload_json` part for multipart)
    pub fn json_body(&self) -> Option<Value> {
        match &self.body {
            PreparedBody::Empty => None,
            PreparedBody::Json(text) | PreparedBody::Multipart { payload_json: text, .. } => {
                serde_json::from_str(text).ok()
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Adds authentication and encodes bodies
#[derive(Clone)]
pub struct RequestBuilder {
    authorization: String,
    user_agent: String,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new(token: &str) -> Self {
        Self {
            authorization: format!("Bot {token}"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn prepare(&self, request: &RestRequest) -> AppResult<PreparedRequest> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&self.authorization)?);
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);

        // GET sends its body as the query string
        if request.method == Method::GET {
            return Ok(PreparedRequest {
                method: Method::GET,
                url: with_query(&request.url, request.body.as_ref()),
                headers,
                body: PreparedBody::Empty,
            });
        }

        if let Some(reason) = request.reason() {
            headers.insert(
                HeaderName::from_static(AUDIT_LOG_REASON),
                header_value(&encode_component(reason))?,
            );
        }

        let body = if let Some(file) = &request.file {
            let payload = request.body.clone().unwrap_or_else(|| json!({}));
            PreparedBody::Multipart {
                file: file.clone(),
                payload_json: serde_json::to_string(&payload)?,
            }
        } else if let Some(body) = &request.body {
            if request.method != Method::DELETE {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            PreparedBody::Json(serde_json::to_string(body)?)
        } else {
            PreparedBody::Empty
        };

        Ok(PreparedRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers,
            body,
        })
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::validation("header contains characters not allowed on the wire"))
}

/// Percent-encode like a URI component (spaces as `%20`)
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Append the scalar entries of a JSON object as query parameters
fn with_query(url: &str, body: Option<&Value>) -> String {
    let Some(Value::Object(params)) = body else {
        return url.to_string();
    };

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::String(s) => {
                query.append_pair(key, s);
            }
            other => {
                query.append_pair(key, &other.to_string());
            }
        }
    }
    let query = query.finish();

    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}
