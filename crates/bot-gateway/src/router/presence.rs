//! Session, presence and user dispatches

use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType};
use crate::shard::ShardState;
use bot_core::{Snowflake, User};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ReadyPayload {
    user: User,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    guilds: Vec<UnavailableGuild>,
}

#[derive(Debug, Deserialize)]
struct UnavailableGuild {
    id: Snowflake,
}

pub(super) fn ready(router: &ShardRouter, shard_id: u32, data: Value) {
    let Some(ReadyPayload {
        user,
        session_id,
        guilds,
    }) = router.decode(GatewayEventType::Ready, data)
    else {
        return;
    };
    let cache = router.cache();
    cache.set_bot_id(user.id);

    // Guilds stream in through GUILD_CREATE afterwards
    let now = Utc::now();
    for guild in guilds.iter().filter(|g| !cache.contains_guild(g.id)) {
        cache.mark_unavailable(guild.id, now);
    }

    router.states().set(shard_id, ShardState::Identified);
    tracing::info!(shard_id, user = %user.tag(), guilds = guilds.len(), "Shard ready");
    router.emit(BotEvent::Ready {
        shard_id,
        user,
        session_id,
    });
}

pub(super) fn presence_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    router.emit(BotEvent::PresenceUpdate(data));
}

pub(super) fn typing_start(router: &ShardRouter, _shard_id: u32, data: Value) {
    router.emit(BotEvent::TypingStart(data));
}

pub(super) fn user_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    let Some(user) = router.decode::<User>(GatewayEventType::UserUpdate, data) else {
        return;
    };
    let cache = router.cache();

    for guild_id in cache.guild_ids() {
        cache.update_guild(guild_id, |guild| {
            if let Some(member) = guild.members.get_mut(&user.id) {
                member.user.patch(&user);
            }
        });
    }
    router.emit(BotEvent::BotUserUpdate(user));
}
