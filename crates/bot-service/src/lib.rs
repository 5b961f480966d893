//! # bot-service
//!
//! Application layer: permission resolution over the entity cache and the
//! outward commands that are checked against it before touching the network.

pub mod dto;
pub mod services;

pub use dto::{AllowedMentions, CreateMessageRequest, CreateWebhookRequest, ExecuteWebhookRequest, Webhook};
pub use services::{MemberService, MessageService, PermissionResolver, ServiceContext, WebhookService};
