//! Guild emoji entity

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Custom emoji owned by a guild
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    pub id: Snowflake,
    pub name: String,
    pub roles: Vec<Snowflake>,
    pub require_colons: bool,
    pub managed: bool,
    pub animated: bool,
    pub available: bool,
}

impl Emoji {
    /// Chat mention form, e.g. `<:name:id>`
    pub fn mention(&self) -> String {
        let prefix = if self.animated { "a" } else { "" };
        format!("<{prefix}:{}:{}>", self.name, self.id)
    }
}
