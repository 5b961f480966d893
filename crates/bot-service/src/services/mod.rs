//! Permission resolution and command services
//!
//! Every command checks the bot's permissions against the cache and
//! validates its payload before a request is queued.

pub mod context;
pub mod member;
pub mod message;
pub mod permission;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use context::ServiceContext;
pub use member::MemberService;
pub use message::MessageService;
pub use permission::PermissionResolver;
pub use webhook::WebhookService;
