//! Shard router
//!
//! Applies gateway dispatches to the entity cache and re-emits them as typed
//! [`BotEvent`]s. A single task owns the router, so frames from every shard
//! are applied one at a time in arrival order.

mod builders;
mod channel;
mod guild;
mod member;
mod message;
mod presence;
mod voice;

#[cfg(test)]
mod testing;

use crate::events::{BotEvent, EventHandlers, GatewayEventType};
use crate::protocol::{GatewayMessage, OpCode};
use crate::shard::{MemberChunkRegistry, ShardStates};
use bot_cache::EntityCache;
use bot_common::MessageUpdatePolicy;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler of one dispatch type
type DispatchFn = fn(&ShardRouter, u32, Value);

pub struct ShardRouter {
    cache: Arc<EntityCache>,
    handlers: EventHandlers,
    chunks: Arc<MemberChunkRegistry>,
    states: Arc<ShardStates>,
    message_update_policy: MessageUpdatePolicy,
    table: HashMap<GatewayEventType, DispatchFn>,
}

impl std::fmt::Debug for ShardRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardRouter")
            .field("handlers", &self.handlers)
            .field("message_update_policy", &self.message_update_policy)
            .field("routes", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl ShardRouter {
    pub fn new(cache: Arc<EntityCache>, handlers: EventHandlers) -> Self {
        Self {
            cache,
            handlers,
            chunks: Arc::new(MemberChunkRegistry::new()),
            states: Arc::new(ShardStates::new()),
            message_update_policy: MessageUpdatePolicy::default(),
            table: dispatch_table(),
        }
    }

    #[must_use]
    pub fn with_chunks(mut self, chunks: Arc<MemberChunkRegistry>) -> Self {
        self.chunks = chunks;
        self
    }

    #[must_use]
    pub fn with_states(mut self, states: Arc<ShardStates>) -> Self {
        self.states = states;
        self
    }

    #[must_use]
    pub fn with_message_update_policy(mut self, policy: MessageUpdatePolicy) -> Self {
        self.message_update_policy = policy;
        self
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    pub fn chunks(&self) -> &Arc<MemberChunkRegistry> {
        &self.chunks
    }

    pub fn states(&self) -> &Arc<ShardStates> {
        &self.states
    }

    pub fn message_update_policy(&self) -> MessageUpdatePolicy {
        self.message_update_policy
    }

    /// Route one frame received on `shard_id`
    pub fn handle_frame(&self, shard_id: u32, frame: GatewayMessage) {
        self.handlers.emit_raw(shard_id, &frame);

        match frame.op {
            OpCode::HeartbeatAck => self.handlers.emit_heartbeat(shard_id),
            OpCode::Dispatch => {
                let Some(name) = frame.t else {
                    tracing::debug!(shard_id, "Dispatch frame without event type");
                    return;
                };
                match GatewayEventType::from_str(&name) {
                    Some(event) => self.dispatch(shard_id, event, frame.d.unwrap_or(Value::Null)),
                    None => self.ignored(shard_id, &name),
                }
            }
            op => {
                // Session frames are handled by the connector
                tracing::trace!(shard_id, op = %op, "Non-dispatch frame");
            }
        }
    }

    /// Apply one dispatch through the lookup table
    pub fn dispatch(&self, shard_id: u32, event: GatewayEventType, data: Value) {
        match self.table.get(&event) {
            Some(handler) => {
                tracing::trace!(shard_id, event = %event, "Dispatching");
                handler(self, shard_id, data);
            }
            None => self.ignored(shard_id, event.as_str()),
        }
    }

    fn ignored(&self, shard_id: u32, event: &str) {
        tracing::debug!(shard_id, event = %event, "Ignoring unhandled dispatch");
        self.handlers
            .emit_debug("event_ignored", json!({ "shard_id": shard_id, "event": event }));
    }

    pub(crate) fn emit(&self, event: BotEvent) {
        self.handlers.emit(&event);
    }

    /// Decode a dispatch payload; a malformed payload drops the event
    pub(crate) fn decode<T: DeserializeOwned>(&self, event: GatewayEventType, data: Value) -> Option<T> {
        match serde_json::from_value(data) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Malformed dispatch payload");
                self.handlers.emit_debug(
                    "event_malformed",
                    json!({ "event": event.as_str(), "error": e.to_string() }),
                );
                None
            }
        }
    }

    /// Report a dispatch dropped because the cache lacks what it refers to
    pub(crate) fn dropped(&self, event: GatewayEventType, reason: &'static str, id: impl std::fmt::Display) {
        let id = id.to_string();
        tracing::debug!(event = %event, reason, id = %id, "Dispatch dropped");
        self.handlers.emit_debug(
            "event_dropped",
            json!({ "event": event.as_str(), "reason": reason, "id": id }),
        );
    }
}

fn dispatch_table() -> HashMap<GatewayEventType, DispatchFn> {
    use GatewayEventType as E;

    let routes: [(GatewayEventType, DispatchFn); 30] = [
        (E::Ready, presence::ready),
        (E::ChannelCreate, channel::channel_create),
        (E::ChannelUpdate, channel::channel_update),
        (E::ChannelDelete, channel::channel_delete),
        (E::GuildCreate, guild::guild_create),
        (E::GuildUpdate, guild::guild_update),
        (E::GuildDelete, guild::guild_delete),
        (E::GuildBanAdd, guild::guild_ban_add),
        (E::GuildBanRemove, guild::guild_ban_remove),
        (E::GuildEmojisUpdate, guild::guild_emojis_update),
        (E::GuildMemberAdd, member::member_add),
        (E::GuildMemberRemove, member::member_remove),
        (E::GuildMemberUpdate, member::member_update),
        (E::GuildMembersChunk, member::members_chunk),
        (E::GuildRoleCreate, guild::role_create),
        (E::GuildRoleUpdate, guild::role_update),
        (E::GuildRoleDelete, guild::role_delete),
        (E::MessageCreate, message::message_create),
        (E::MessageUpdate, message::message_update),
        (E::MessageDelete, message::message_delete),
        (E::MessageDeleteBulk, message::message_delete_bulk),
        (E::MessageReactionAdd, message::reaction_add),
        (E::MessageReactionRemove, message::reaction_remove),
        (E::MessageReactionRemoveAll, message::reaction_remove_all),
        (E::MessageReactionRemoveEmoji, message::reaction_remove_emoji),
        (E::PresenceUpdate, presence::presence_update),
        (E::TypingStart, presence::typing_start),
        (E::UserUpdate, presence::user_update),
        (E::VoiceStateUpdate, voice::voice_state_update),
        (E::WebhooksUpdate, channel::webhooks_update),
    ];
    routes.into_iter().collect()
}
