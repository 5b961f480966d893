//! Request DTOs for outward commands

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bot_core::Snowflake;
use bot_rest::FileAttachment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationError};

/// Longest message content the upstream accepts, in characters
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Embeds beyond this count are dropped from webhook executions
pub const MAX_EMBEDS: usize = 10;

/// Explicit user/role mention lists are cut to this length
pub const MAX_MENTION_IDS: usize = 100;

// ============================================================================
// Mentions
// ============================================================================

/// Mention categories that may be parsed out of the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    Roles,
    Users,
    Everyone,
}

/// Which mentions in the content actually ping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedMentions {
    #[serde(default)]
    pub parse: Vec<MentionKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<Snowflake>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Snowflake>,
}

impl AllowedMentions {
    /// Make the lists acceptable upstream
    ///
    /// An explicit id list excludes parsing the same category, and lists are
    /// cut to [`MAX_MENTION_IDS`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.users.is_empty() {
            self.parse.retain(|k| *k != MentionKind::Users);
            self.users.truncate(MAX_MENTION_IDS);
        }
        if !self.roles.is_empty() {
            self.parse.retain(|k| *k != MentionKind::Roles);
            self.roles.truncate(MAX_MENTION_IDS);
        }
        self
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Send message request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[serde(default)]
    #[validate(length(max = 2000, message = "Content must be at most 2000 characters"))]
    pub content: String,

    #[serde(default)]
    pub tts: bool,

    pub embed: Option<Value>,

    pub mentions: Option<AllowedMentions>,

    /// Message being replied to, in the same channel
    pub reply_to: Option<Snowflake>,

    #[serde(skip)]
    pub file: Option<FileAttachment>,
}

impl CreateMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Value) -> Self {
        self.embed = Some(embed);
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.embed.is_none() && self.file.is_none()
    }

    /// JSON body sent upstream (the file travels separately)
    pub fn to_body(&self, channel_id: Snowflake) -> Value {
        let mut body = Map::new();
        if !self.content.is_empty() {
            body.insert("content".into(), json!(self.content));
        }
        if self.tts {
            body.insert("tts".into(), json!(true));
        }
        if let Some(embed) = &self.embed {
            body.insert("embed".into(), embed.clone());
        }
        if let Some(mentions) = &self.mentions {
            body.insert("allowed_mentions".into(), json!(mentions.clone().normalized()));
        }
        if let Some(message_id) = self.reply_to {
            body.insert(
                "message_reference".into(),
                json!({ "message_id": message_id, "channel_id": channel_id }),
            );
        }
        Value::Object(body)
    }
}

// ============================================================================
// Webhooks
// ============================================================================

/// Image uploaded as a webhook avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookAvatar {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl WebhookAvatar {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// `data:` URI the upstream expects for image fields
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.data))
    }
}

/// Create webhook request
#[derive(Debug, Clone, Validate)]
pub struct CreateWebhookRequest {
    #[validate(
        length(min = 2, max = 32, message = "Webhook name must be 2-32 characters"),
        custom(function = "not_reserved_webhook_name")
    )]
    pub name: String,

    pub avatar: Option<WebhookAvatar>,
}

impl CreateWebhookRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: None,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({
            "name": self.name,
            "avatar": self.avatar.as_ref().map(WebhookAvatar::to_data_uri),
        })
    }
}

fn not_reserved_webhook_name(name: &str) -> Result<(), ValidationError> {
    if name.eq_ignore_ascii_case("clyde") {
        return Err(ValidationError::new("reserved_name"));
    }
    Ok(())
}

/// Execute webhook request
#[derive(Debug, Clone, Default, Validate)]
pub struct ExecuteWebhookRequest {
    #[validate(length(max = 2000, message = "Content must be at most 2000 characters"))]
    pub content: Option<String>,

    #[validate(length(min = 1, max = 80, message = "Username must be 1-80 characters"))]
    pub username: Option<String>,

    pub avatar_url: Option<String>,

    pub tts: bool,

    pub embeds: Vec<Value>,

    pub mentions: Option<AllowedMentions>,

    pub file: Option<FileAttachment>,

    /// Wait for the created message and return it
    pub wait: bool,
}

impl ExecuteWebhookRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.file.is_none() && self.embeds.is_empty()
    }

    /// Drop excess embeds and normalize mention lists
    #[must_use]
    pub fn truncated(mut self) -> Self {
        self.embeds.truncate(MAX_EMBEDS);
        self.mentions = self.mentions.map(AllowedMentions::normalized);
        self
    }

    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(content) = &self.content {
            body.insert("content".into(), json!(content));
        }
        if let Some(username) = &self.username {
            body.insert("username".into(), json!(username));
        }
        if let Some(avatar_url) = &self.avatar_url {
            body.insert("avatar_url".into(), json!(avatar_url));
        }
        if self.tts {
            body.insert("tts".into(), json!(true));
        }
        if !self.embeds.is_empty() {
            body.insert("embeds".into(), json!(self.embeds));
        }
        if let Some(mentions) = &self.mentions {
            body.insert("allowed_mentions".into(), json!(mentions));
        }
        Value::Object(body)
    }
}
