//! Guild payload mapping and property diffing

use bot_core::{Channel, Emoji, Guild, GuildMember, Role, Snowflake, VoiceState};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys of a GUILD_UPDATE payload that are never diffed
pub(super) const GUILD_UPDATE_SKIPPED: [&str; 5] = ["roles", "guild_hashes", "guild_id", "max_members", "emojis"];

/// GUILD_CREATE payload
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct GuildPayload {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Snowflake,
    pub member_count: u64,
    pub unavailable: bool,
    pub roles: Vec<Role>,
    pub members: Vec<GuildMember>,
    pub channels: Vec<Channel>,
    pub emojis: Vec<Emoji>,
    pub voice_states: Vec<VoiceState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build the cached guild and the channels it links to
pub(super) fn build_guild(payload: GuildPayload, shard_id: u32) -> (Guild, Vec<Channel>) {
    let GuildPayload {
        id,
        name,
        icon,
        owner_id,
        member_count,
        roles,
        members,
        channels,
        emojis,
        voice_states,
        extra,
        ..
    } = payload;

    let channels: Vec<Channel> = channels
        .into_iter()
        .map(|mut channel| {
            channel.guild_id = Some(id);
            channel
        })
        .collect();

    let mut guild = Guild::new(id, name, owner_id);
    guild.icon = icon;
    guild.shard_id = shard_id;
    guild.member_count = member_count;
    guild.roles = roles.into_iter().map(|role| (role.id, role)).collect();
    guild.members = members
        .into_iter()
        .map(|mut member| {
            member.guild_id = id;
            (member.id(), member)
        })
        .collect();
    guild.channel_ids = channels.iter().map(|c| c.id).collect();
    guild.emojis = emojis;
    guild.voice_states = voice_states
        .into_iter()
        .map(|mut state| {
            state.guild_id = Some(id);
            (state.user_id, state)
        })
        .collect();
    guild.extra = extra;

    (guild, channels)
}

/// Current value of a guild property, as it appears on the wire
pub(super) fn guild_property(guild: &Guild, key: &str) -> Value {
    match key {
        "id" => Value::String(guild.id.to_string()),
        "name" => Value::String(guild.name.clone()),
        "icon" => guild.icon.clone().map_or(Value::Null, Value::String),
        "owner_id" => Value::String(guild.owner_id.to_string()),
        "member_count" => guild.member_count.into(),
        _ => guild.extra.get(key).cloned().unwrap_or(Value::Null),
    }
}

pub(super) fn set_guild_property(guild: &mut Guild, key: &str, value: Value) {
    match key {
        "id" => {}
        "name" => {
            if let Value::String(name) = value {
                guild.name = name;
            }
        }
        "icon" => guild.icon = value.as_str().map(str::to_string),
        "owner_id" => {
            if let Some(owner_id) = value.as_str().and_then(|s| Snowflake::parse(s).ok()) {
                guild.owner_id = owner_id;
            }
        }
        "member_count" => {
            if let Some(count) = value.as_u64() {
                guild.member_count = count;
            }
        }
        _ => {
            guild.extra.insert(key.to_string(), value);
        }
    }
}

/// Whether a property changed: two falsy values are equal, arrays compare as sets
pub(super) fn property_changed(old: &Value, new: &Value) -> bool {
    if is_falsy(old) && is_falsy(new) {
        return false;
    }
    match (old, new) {
        (Value::Array(a), Value::Array(b)) => !same_elements(a, b),
        _ => old != new,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn same_elements(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|v| b.contains(v)) && b.iter().all(|v| a.contains(v))
}
