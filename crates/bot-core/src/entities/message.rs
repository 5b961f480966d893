//! Message entity - a chat message as mirrored in the cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ReactionCount, ReactionEmoji, User};
use crate::value_objects::Snowflake;

/// Message entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: User,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub tts: bool,
    pub pinned: bool,
    pub mentions: Vec<User>,
    pub mention_roles: Vec<Snowflake>,
    pub mention_everyone: bool,
    pub attachments: Vec<Attachment>,
    /// Embeds are passed through untouched
    pub embeds: Vec<Value>,
    pub reactions: Vec<ReactionCount>,
}

impl Message {
    /// Create a new Message
    pub fn new(id: Snowflake, channel_id: Snowflake, author: User, content: impl Into<String>) -> Self {
        Self {
            id,
            channel_id,
            author,
            content: content.into(),
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    /// Ids of the mentioned users
    pub fn mention_ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.mentions.iter().map(|u| u.id)
    }

    /// Reaction counter for an emoji, if any
    pub fn reaction(&self, emoji: &ReactionEmoji) -> Option<&ReactionCount> {
        self.reactions.iter().find(|r| r.emoji.same_as(emoji))
    }

    /// Count one more reaction, creating the counter on first use
    pub fn add_reaction(&mut self, emoji: &ReactionEmoji, me: bool) {
        if let Some(existing) = self.reactions.iter_mut().find(|r| r.emoji.same_as(emoji)) {
            existing.count += 1;
            existing.me |= me;
        } else {
            self.reactions
                .push(ReactionCount::new(emoji.clone(), 1, me));
        }
    }

    /// Count one reaction less; the counter is dropped when it reaches zero
    pub fn remove_reaction(&mut self, emoji: &ReactionEmoji, me: bool) {
        if let Some(pos) = self.reactions.iter().position(|r| r.emoji.same_as(emoji)) {
            let entry = &mut self.reactions[pos];
            entry.count = entry.count.saturating_sub(1);
            if me {
                entry.me = false;
            }
            if entry.count == 0 {
                self.reactions.remove(pos);
            }
        }
    }

    /// Drop every counter for one emoji
    pub fn clear_emoji(&mut self, emoji: &ReactionEmoji) {
        self.reactions.retain(|r| !r.emoji.same_as(emoji));
    }

    /// Get a truncated preview of the message (for logs)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub url: String,
    pub proxy_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Attachment {
    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
            || self.width.is_some()
    }
}
