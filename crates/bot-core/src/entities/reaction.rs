//! Reaction counters kept on cached messages

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Emoji reference used by reactions (custom emojis carry an id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionEmoji {
    pub id: Option<Snowflake>,
    pub name: Option<String>,
}

impl ReactionEmoji {
    /// Unicode emoji
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Two emojis are the same reaction when both id and name match
    #[inline]
    pub fn same_as(&self, other: &ReactionEmoji) -> bool {
        self.id == other.id && self.name == other.name
    }
}

/// Aggregated reaction count for one emoji on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: ReactionEmoji,
    pub count: u32,
    #[serde(default)]
    pub me: bool,
}

impl ReactionCount {
    /// Create a new ReactionCount
    pub fn new(emoji: ReactionEmoji, count: u32, me: bool) -> Self {
        Self { emoji, count, me }
    }
}
