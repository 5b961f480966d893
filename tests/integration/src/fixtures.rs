//! Test fixtures and data generators
//!
//! Gateway and REST payloads for one scenario guild:
//!
//! | id  | what                                                      |
//! |-----|-----------------------------------------------------------|
//! | 1   | guild, and its everyone role                              |
//! | 50  | role `R1`, held by the bot and [`MEMBER`]                 |
//! | 10  | `#general`, no overwrites                                 |
//! | 11  | `#announcements`, everyone denied sending, `R1` allowed   |
//! | 12  | `#muted`, `R1` allowed sending, [`MEMBER`] denied         |
//! | 13  | `#read-only`, everyone denied sending                     |

use bot_core::Permissions;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

pub const GUILD: u64 = 1;
pub const R1: u64 = 50;
pub const GENERAL: u64 = 10;
pub const ANNOUNCEMENTS: u64 = 11;
pub const MUTED: u64 = 12;
pub const READ_ONLY: u64 = 13;
pub const OWNER: u64 = 100;
pub const BOT: u64 = 200;
pub const MEMBER: u64 = 300;
/// Holds no role besides everyone
pub const GUEST: u64 = 301;

/// Counter for unique message ids
static COUNTER: AtomicU64 = AtomicU64::new(10_000);

pub fn unique_id() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub fn everyone_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ADD_REACTIONS
}

pub fn r1_permissions() -> Permissions {
    Permissions::MANAGE_MESSAGES | Permissions::EMBED_LINKS | Permissions::ATTACH_FILES
}

/// `GET /gateway/bot`
pub fn gateway_bot(shards: u32) -> Value {
    json!({
        "url": "wss://gateway.test",
        "shards": shards,
        "session_start_limit": {"total": 1000, "remaining": 999, "reset_after": 0}
    })
}

/// READY for the given bot, with the scenario guild still unavailable
pub fn ready(bot_id: u64) -> Value {
    json!({
        "v": 6,
        "user": {"id": bot_id.to_string(), "username": "testbot", "discriminator": "0001", "bot": true},
        "session_id": format!("session-{bot_id}"),
        "guilds": [{"id": GUILD.to_string(), "unavailable": true}]
    })
}

pub fn user(id: u64) -> Value {
    json!({"id": id.to_string(), "username": format!("user{id}"), "discriminator": "0001"})
}

pub fn member(id: u64, roles: &[u64]) -> Value {
    json!({
        "user": user(id),
        "guild_id": GUILD.to_string(),
        "roles": roles.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "joined_at": "2020-01-01T00:00:00+00:00",
        "deaf": false,
        "mute": false
    })
}

pub fn role(id: u64, position: i32, permissions: Permissions) -> Value {
    json!({
        "id": id.to_string(),
        "name": format!("role{id}"),
        "position": position,
        "permissions": permissions.bits().to_string()
    })
}

pub fn role_overwrite(role_id: u64, allow: Permissions, deny: Permissions) -> Value {
    json!({"id": role_id.to_string(), "type": "role", "allow": allow.bits(), "deny": deny.bits()})
}

pub fn member_overwrite(user_id: u64, allow: Permissions, deny: Permissions) -> Value {
    json!({"id": user_id.to_string(), "type": "member", "allow": allow.bits(), "deny": deny.bits()})
}

pub fn text_channel(id: u64, name: &str, overwrites: Vec<Value>) -> Value {
    json!({
        "id": id.to_string(),
        "guild_id": GUILD.to_string(),
        "type": 0,
        "name": name,
        "position": id,
        "permission_overwrites": overwrites
    })
}

/// The full scenario guild
pub fn guild_create() -> Value {
    let send = Permissions::SEND_MESSAGES;
    let none = Permissions::empty();
    json!({
        "id": GUILD.to_string(),
        "name": "Integration Guild",
        "icon": null,
        "owner_id": OWNER.to_string(),
        "member_count": 4,
        "region": "eu-west",
        "afk_timeout": 300,
        "features": [],
        "roles": [role(GUILD, 0, everyone_permissions()), role(R1, 3, r1_permissions())],
        "members": [
            member(OWNER, &[]),
            member(BOT, &[R1]),
            member(MEMBER, &[R1]),
            member(GUEST, &[]),
        ],
        "channels": [
            text_channel(GENERAL, "general", vec![]),
            text_channel(ANNOUNCEMENTS, "announcements", vec![
                role_overwrite(GUILD, none, send),
                role_overwrite(R1, send, none),
            ]),
            text_channel(MUTED, "muted", vec![
                role_overwrite(R1, send, none),
                member_overwrite(MEMBER, none, send),
            ]),
            text_channel(READ_ONLY, "read-only", vec![role_overwrite(GUILD, none, send)]),
        ],
        "emojis": [],
        "voice_states": []
    })
}

pub fn message(id: u64, channel_id: u64, author: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": channel_id.to_string(),
        "guild_id": GUILD.to_string(),
        "author": user(author),
        "content": content,
        "timestamp": "2021-05-01T10:00:00+00:00",
        "edited_timestamp": null,
        "tts": false,
        "pinned": false,
        "attachments": [],
        "embeds": []
    })
}
