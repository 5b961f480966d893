//! Command payloads
//!
//! Request DTOs are validated before a request is queued.

pub mod requests;
pub mod responses;

pub use requests::{
    AllowedMentions, CreateMessageRequest, CreateWebhookRequest, ExecuteWebhookRequest,
    MentionKind, WebhookAvatar, MAX_EMBEDS, MAX_MENTION_IDS, MAX_MESSAGE_LENGTH,
};
pub use responses::Webhook;
