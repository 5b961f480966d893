//! Entity cache
//!
//! Mirrors the remote entity graph using DashMap for thread-safe access.
//! The gateway router is the only writer; every other component reads.

use bot_core::{Channel, Guild, GuildMember, Message, Snowflake};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory mirror of guilds, channels and messages
///
/// Each mutation is a single entry-level operation, so readers never observe
/// a half-applied update of one record.
#[derive(Debug, Default)]
pub struct EntityCache {
    /// Guild records by guild ID (members, roles, emojis, voice states nested)
    guilds: DashMap<Snowflake, Guild>,

    /// Channel records by channel ID
    channels: DashMap<Snowflake, Channel>,

    /// Message records by message ID
    messages: DashMap<Snowflake, Message>,

    /// Guilds reported unavailable, with the time they went away
    unavailable_guilds: DashMap<Snowflake, DateTime<Utc>>,

    /// The bot's own user id, set on READY
    bot_id: RwLock<Option<Snowflake>>,
}

impl EntityCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // =========================================================================
    // Bot identity
    // =========================================================================

    pub fn bot_id(&self) -> Option<Snowflake> {
        *self.bot_id.read()
    }

    pub fn set_bot_id(&self, id: Snowflake) {
        *self.bot_id.write() = Some(id);
        tracing::debug!(bot_id = %id, "Bot user id recorded");
    }

    /// Whether the given user is the bot itself
    pub fn is_bot(&self, user_id: Snowflake) -> bool {
        self.bot_id() == Some(user_id)
    }

    // =========================================================================
    // Guilds
    // =========================================================================

    /// Get a snapshot of a guild
    pub fn get_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.get(&id).map(|g| g.clone())
    }

    /// Read a guild in place without cloning it
    pub fn with_guild<R>(&self, id: Snowflake, f: impl FnOnce(&Guild) -> R) -> Option<R> {
        self.guilds.get(&id).map(|g| f(&g))
    }

    /// Mutate a guild in place; `None` when the guild is not cached
    pub fn update_guild<R>(&self, id: Snowflake, f: impl FnOnce(&mut Guild) -> R) -> Option<R> {
        self.guilds.get_mut(&id).map(|mut g| f(&mut g))
    }

    /// Insert or replace a guild, returning the previous record
    pub fn insert_guild(&self, guild: Guild) -> Option<Guild> {
        let id = guild.id;
        let old = self.guilds.insert(id, guild);
        tracing::trace!(guild_id = %id, replaced = old.is_some(), "Guild cached");
        old
    }

    pub fn remove_guild(&self, id: Snowflake) -> Option<Guild> {
        let removed = self.guilds.remove(&id).map(|(_, g)| g);
        if removed.is_some() {
            tracing::trace!(guild_id = %id, "Guild removed");
        }
        removed
    }

    pub fn contains_guild(&self, id: Snowflake) -> bool {
        self.guilds.contains_key(&id)
    }

    pub fn guild_ids(&self) -> Vec<Snowflake> {
        self.guilds.iter().map(|g| *g.key()).collect()
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    // =========================================================================
    // Members (nested in guilds)
    // =========================================================================

    pub fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<GuildMember> {
        self.guilds
            .get(&guild_id)
            .and_then(|g| g.members.get(&user_id).cloned())
    }

    /// Insert or replace a member; returns false when the guild is not cached
    pub fn upsert_member(&self, guild_id: Snowflake, mut member: GuildMember) -> bool {
        member.guild_id = guild_id;
        self.update_guild(guild_id, |guild| {
            guild.members.insert(member.id(), member);
        })
        .is_some()
    }

    // =========================================================================
    // Unavailable guilds
    // =========================================================================

    pub fn mark_unavailable(&self, id: Snowflake, since: DateTime<Utc>) {
        self.unavailable_guilds.insert(id, since);
        tracing::debug!(guild_id = %id, "Guild marked unavailable");
    }

    /// Clear the unavailable flag, returning whether it was set
    pub fn mark_available(&self, id: Snowflake) -> bool {
        self.unavailable_guilds.remove(&id).is_some()
    }

    pub fn is_unavailable(&self, id: Snowflake) -> bool {
        self.unavailable_guilds.contains_key(&id)
    }

    pub fn unavailable_count(&self) -> usize {
        self.unavailable_guilds.len()
    }

    // =========================================================================
    // Channels
    // =========================================================================

    pub fn get_channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.get(&id).map(|c| c.clone())
    }

    pub fn with_channel<R>(&self, id: Snowflake, f: impl FnOnce(&Channel) -> R) -> Option<R> {
        self.channels.get(&id).map(|c| f(&c))
    }

    pub fn update_channel<R>(&self, id: Snowflake, f: impl FnOnce(&mut Channel) -> R) -> Option<R> {
        self.channels.get_mut(&id).map(|mut c| f(&mut c))
    }

    /// Insert or replace a channel, returning the previous record
    pub fn insert_channel(&self, channel: Channel) -> Option<Channel> {
        self.channels.insert(channel.id, channel)
    }

    /// Remove a channel together with its cached messages
    pub fn remove_channel(&self, id: Snowflake) -> Option<Channel> {
        let removed = self.channels.remove(&id).map(|(_, c)| c);
        if removed.is_some() {
            let purged = self.remove_channel_messages(id);
            tracing::trace!(channel_id = %id, purged, "Channel removed");
        }
        removed
    }

    pub fn contains_channel(&self, id: Snowflake) -> bool {
        self.channels.contains_key(&id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Remove every channel of a guild and their messages
    pub fn remove_guild_channels(&self, guild_id: Snowflake) -> Vec<Snowflake> {
        let ids: Vec<Snowflake> = self
            .channels
            .iter()
            .filter(|c| c.guild_id == Some(guild_id))
            .map(|c| *c.key())
            .collect();

        for id in &ids {
            self.remove_channel(*id);
        }
        ids
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(&id).map(|m| m.clone())
    }

    pub fn update_message<R>(&self, id: Snowflake, f: impl FnOnce(&mut Message) -> R) -> Option<R> {
        self.messages.get_mut(&id).map(|mut m| f(&mut m))
    }

    pub fn insert_message(&self, message: Message) -> Option<Message> {
        self.messages.insert(message.id, message)
    }

    pub fn remove_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.remove(&id).map(|(_, m)| m)
    }

    pub fn contains_message(&self, id: Snowflake) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Drop every cached message of a channel, returning how many went away
    pub fn remove_channel_messages(&self, channel_id: Snowflake) -> usize {
        let before = self.messages.len();
        self.messages.retain(|_, m| m.channel_id != channel_id);
        before.saturating_sub(self.messages.len())
    }

    /// Drop every cached message of a guild, returning how many went away
    pub fn remove_guild_messages(&self, guild_id: Snowflake) -> usize {
        let before = self.messages.len();
        self.messages.retain(|_, m| m.guild_id != Some(guild_id));
        before.saturating_sub(self.messages.len())
    }
}
