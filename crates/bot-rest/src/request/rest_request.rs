//! Request descriptions submitted to the queue

use reqwest::Method;
use serde_json::Value;

/// A file uploaded alongside a JSON payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// One REST call: method, absolute URL, optional JSON body and file
///
/// `bucket_id` ties the request to a rate-limit bucket learned from an
/// earlier `x-ratelimit-bucket` header.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub file: Option<FileAttachment>,
    pub bucket_id: Option<String>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            file: None,
            bucket_id: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket_id: impl Into<String>) -> Self {
        self.bucket_id = Some(bucket_id.into());
        self
    }

    /// Audit log reason carried in the body, if any
    pub fn reason(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("reason"))
            .and_then(Value::as_str)
    }
}
