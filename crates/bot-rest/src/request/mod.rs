//! Outgoing REST requests and how they are put on the wire

mod builder;
mod rest_request;

pub use builder::{PreparedBody, PreparedRequest, RequestBuilder, AUDIT_LOG_REASON};
pub use rest_request::{FileAttachment, RestRequest};
