//! Router test helpers

use super::ShardRouter;
use crate::events::{BotEvent, EventHandlers, EventKind, GatewayEventType};
use bot_cache::EntityCache;
use bot_core::{DebugEvent, DebugHook};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const GUILD: u64 = 1;
pub const CHANNEL: u64 = 10;
pub const OWNER: u64 = 100;
pub const BOT: u64 = 200;
pub const MEMBER: u64 = 300;

pub type Recorded = Arc<Mutex<Vec<BotEvent>>>;

/// Handlers recording every event of the given kinds
pub fn recorder(kinds: &[EventKind]) -> (EventHandlers, Recorded) {
    let events: Recorded = Arc::default();
    let handlers = kinds.iter().fold(EventHandlers::new(), |handlers, kind| {
        let sink = Arc::clone(&events);
        handlers.on(*kind, move |event| sink.lock().unwrap().push(event.clone()))
    });
    (handlers, events)
}

#[derive(Clone, Default)]
pub struct DebugLog(Arc<Mutex<Vec<DebugEvent>>>);

impl DebugLog {
    pub fn hook(&self) -> DebugHook {
        let sink = Arc::clone(&self.0);
        Arc::new(move |event| sink.lock().unwrap().push(event))
    }

    pub fn handlers(&self) -> EventHandlers {
        EventHandlers::new().on_debug(self.hook())
    }

    pub fn events(&self) -> Vec<DebugEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

pub fn user(id: u64) -> Value {
    json!({"id": id.to_string(), "username": format!("user{id}"), "discriminator": "0001"})
}

pub fn member(id: u64, roles: &[u64]) -> Value {
    json!({
        "user": user(id),
        "roles": roles.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "joined_at": "2020-01-01T00:00:00+00:00",
        "deaf": false,
        "mute": false
    })
}

pub fn role(id: u64, position: i32, permissions: u64) -> Value {
    json!({"id": id.to_string(), "name": format!("role{id}"), "position": position, "permissions": permissions.to_string()})
}

/// A GUILD_CREATE payload: owner, bot and one member, one text channel
pub fn guild_payload() -> Value {
    json!({
        "id": GUILD.to_string(),
        "name": "Test Guild",
        "icon": null,
        "owner_id": OWNER.to_string(),
        "member_count": 3,
        "region": "eu-west",
        "afk_timeout": 300,
        "features": ["NEWS", "BANNER"],
        "roles": [role(GUILD, 0, 1024), role(50, 5, 8192)],
        "members": [member(OWNER, &[]), member(BOT, &[50]), member(MEMBER, &[])],
        "channels": [{"id": CHANNEL.to_string(), "type": 0, "name": "general"}],
        "emojis": [{"id": "900", "name": "party"}],
        "voice_states": []
    })
}

/// A router whose cache holds the guild from [`guild_payload`] and the bot id
pub fn seeded_router(handlers: EventHandlers) -> ShardRouter {
    let cache = EntityCache::new_shared();
    cache.set_bot_id(bot_core::Snowflake::new(BOT));
    let router = ShardRouter::new(cache, handlers);
    router.dispatch(0, GatewayEventType::GuildCreate, guild_payload());
    router
}

pub fn message(id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": CHANNEL.to_string(),
        "guild_id": GUILD.to_string(),
        "author": user(MEMBER),
        "content": content,
        "timestamp": "2021-05-01T10:00:00+00:00",
        "edited_timestamp": null
    })
}
