//! Guild, ban, emoji and role dispatches

use super::builders::{build_guild, guild_property, property_changed, set_guild_property, GuildPayload, GUILD_UPDATE_SKIPPED};
use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType, GuildChange, MemberOrUser};
use bot_core::{Emoji, Role, Snowflake, User};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GuildUpdateHeader {
    id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct GuildDeletePayload {
    id: Snowflake,
    #[serde(default)]
    unavailable: bool,
}

#[derive(Debug, Deserialize)]
struct GuildBanPayload {
    guild_id: Snowflake,
    user: User,
}

#[derive(Debug, Deserialize)]
struct GuildEmojisPayload {
    guild_id: Snowflake,
    emojis: Vec<Emoji>,
}

#[derive(Debug, Deserialize)]
struct GuildRolePayload {
    guild_id: Snowflake,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct GuildRoleDeletePayload {
    guild_id: Snowflake,
    role_id: Snowflake,
}

pub(super) fn guild_create(router: &ShardRouter, shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildCreate;
    let Some(payload) = router.decode::<GuildPayload>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    // Replays after a reconnect must not reset live state
    if cache.contains_guild(payload.id) {
        router.dropped(EVENT, "guild_already_cached", payload.id);
        return;
    }
    if payload.unavailable {
        cache.mark_unavailable(payload.id, Utc::now());
        router.dropped(EVENT, "guild_unavailable", payload.id);
        return;
    }

    let (guild, channels) = build_guild(payload, shard_id);
    for channel in channels {
        cache.insert_channel(channel);
    }
    cache.mark_available(guild.id);
    cache.insert_guild(guild.clone());

    tracing::debug!(
        shard_id,
        guild_id = %guild.id,
        members = guild.members.len(),
        channels = guild.channel_ids.len(),
        "Guild cached"
    );
    router.emit(BotEvent::GuildCreate(Box::new(guild)));
}

pub(super) fn guild_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildUpdate;
    let Some(GuildUpdateHeader { id }) = router.decode(EVENT, data.clone()) else {
        return;
    };
    let Value::Object(fields) = data else {
        return;
    };

    let updated = router.cache().update_guild(id, |guild| {
        let mut changes = Vec::new();
        for (key, value) in fields {
            if GUILD_UPDATE_SKIPPED.contains(&key.as_str()) {
                continue;
            }
            let old = guild_property(guild, &key);
            if !property_changed(&old, &value) {
                continue;
            }
            set_guild_property(guild, &key, value.clone());
            changes.push(GuildChange { key, old, new: value });
        }
        (guild.clone(), changes)
    });

    let Some((guild, changes)) = updated else {
        router.dropped(EVENT, "guild_not_cached", id);
        return;
    };
    tracing::debug!(guild_id = %id, changed = changes.len(), "Guild updated");
    router.emit(BotEvent::GuildUpdate {
        guild: Box::new(guild),
        changes,
    });
}

pub(super) fn guild_delete(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildDelete;
    let Some(payload) = router.decode::<GuildDeletePayload>(EVENT, data) else {
        return;
    };
    let cache = router.cache();
    if !cache.contains_guild(payload.id) {
        router.dropped(EVENT, "guild_not_cached", payload.id);
        return;
    }

    cache.remove_guild_channels(payload.id);
    cache.remove_guild_messages(payload.id);

    if payload.unavailable {
        cache.update_guild(payload.id, |guild| guild.channel_ids.clear());
        cache.mark_unavailable(payload.id, Utc::now());
        tracing::info!(guild_id = %payload.id, "Guild became unavailable");
        return;
    }

    if let Some(guild) = cache.remove_guild(payload.id) {
        tracing::debug!(guild_id = %guild.id, "Guild removed");
        router.emit(BotEvent::GuildDelete(Box::new(guild)));
    }
}

fn ban_target(router: &ShardRouter, event: GatewayEventType, data: Value) -> Option<(Snowflake, MemberOrUser)> {
    let GuildBanPayload { guild_id, user } = router.decode(event, data)?;
    let cache = router.cache();
    if !cache.contains_guild(guild_id) {
        router.dropped(event, "guild_not_cached", guild_id);
        return None;
    }
    let target = cache
        .get_member(guild_id, user.id)
        .map_or(MemberOrUser::User(user), MemberOrUser::Member);
    Some((guild_id, target))
}

pub(super) fn guild_ban_add(router: &ShardRouter, _shard_id: u32, data: Value) {
    if let Some((guild_id, target)) = ban_target(router, GatewayEventType::GuildBanAdd, data) {
        router.emit(BotEvent::GuildBanAdd { guild_id, target });
    }
}

pub(super) fn guild_ban_remove(router: &ShardRouter, _shard_id: u32, data: Value) {
    if let Some((guild_id, target)) = ban_target(router, GatewayEventType::GuildBanRemove, data) {
        router.emit(BotEvent::GuildBanRemove { guild_id, target });
    }
}

pub(super) fn guild_emojis_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildEmojisUpdate;
    let Some(GuildEmojisPayload { guild_id, emojis }) = router.decode(EVENT, data) else {
        return;
    };

    let old = router
        .cache()
        .update_guild(guild_id, |guild| std::mem::replace(&mut guild.emojis, emojis.clone()));
    match old {
        Some(old) => router.emit(BotEvent::GuildEmojisUpdate { guild_id, emojis, old }),
        None => router.dropped(EVENT, "guild_not_cached", guild_id),
    }
}

pub(super) fn role_create(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildRoleCreate;
    let Some(GuildRolePayload { guild_id, role }) = router.decode(EVENT, data) else {
        return;
    };

    let stored = router.cache().update_guild(guild_id, |guild| {
        guild.roles.insert(role.id, role.clone());
    });
    match stored {
        Some(()) => router.emit(BotEvent::RoleCreate { guild_id, role }),
        None => router.dropped(EVENT, "guild_not_cached", guild_id),
    }
}

pub(super) fn role_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildRoleUpdate;
    let Some(GuildRolePayload { guild_id, role }) = router.decode(EVENT, data) else {
        return;
    };

    let replaced = router.cache().update_guild(guild_id, |guild| {
        guild
            .roles
            .get_mut(&role.id)
            .map(|slot| std::mem::replace(slot, role.clone()))
    });
    match replaced {
        Some(Some(old)) => router.emit(BotEvent::RoleUpdate { guild_id, role, old }),
        Some(None) => router.dropped(EVENT, "role_not_cached", role.id),
        None => router.dropped(EVENT, "guild_not_cached", guild_id),
    }
}

pub(super) fn role_delete(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildRoleDelete;
    let Some(GuildRoleDeletePayload { guild_id, role_id }) = router.decode(EVENT, data) else {
        return;
    };

    let removed = router
        .cache()
        .update_guild(guild_id, |guild| guild.roles.remove(&role_id));
    match removed {
        Some(Some(role)) => router.emit(BotEvent::RoleDelete { guild_id, role }),
        Some(None) => router.dropped(EVENT, "role_not_cached", role_id),
        None => router.dropped(EVENT, "guild_not_cached", guild_id),
    }
}
