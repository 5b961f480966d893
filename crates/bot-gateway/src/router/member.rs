//! Guild member dispatches

use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType, MemberOrUser};
use bot_core::{GuildMember, Snowflake, User};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct MemberRemovePayload {
    guild_id: Snowflake,
    user: User,
}

#[derive(Debug, Deserialize)]
struct MembersChunkPayload {
    guild_id: Snowflake,
    members: Vec<GuildMember>,
    chunk_index: u32,
    chunk_count: u32,
    #[serde(default)]
    nonce: Option<String>,
}

pub(super) fn member_add(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildMemberAdd;
    let Some(member) = router.decode::<GuildMember>(EVENT, data) else {
        return;
    };
    let guild_id = member.guild_id;

    let stored = router.cache().update_guild(guild_id, |guild| {
        if guild.members.insert(member.id(), member.clone()).is_none() {
            guild.member_count += 1;
        }
    });
    match stored {
        Some(()) => router.emit(BotEvent::GuildMemberAdd(member)),
        None => router.dropped(EVENT, "guild_not_cached", guild_id),
    }
}

pub(super) fn member_remove(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildMemberRemove;
    let Some(MemberRemovePayload { guild_id, user }) = router.decode(EVENT, data) else {
        return;
    };

    let removed = router.cache().update_guild(guild_id, |guild| {
        guild.member_count = guild.member_count.saturating_sub(1);
        guild.voice_states.remove(&user.id);
        guild.members.remove(&user.id)
    });
    let Some(removed) = removed else {
        router.dropped(EVENT, "guild_not_cached", guild_id);
        return;
    };

    let target = removed.map_or(MemberOrUser::User(user), MemberOrUser::Member);
    router.emit(BotEvent::GuildMemberRemove { guild_id, target });
}

pub(super) fn member_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildMemberUpdate;
    let Some(mut member) = router.decode::<GuildMember>(EVENT, data) else {
        return;
    };
    let guild_id = member.guild_id;

    let updated = router.cache().update_guild(guild_id, |guild| {
        let old = guild.members.get(&member.id()).cloned();
        // Update payloads omit join data
        if let Some(old) = &old {
            member.joined_at = old.joined_at;
            member.deaf = old.deaf;
            member.mute = old.mute;
        }
        guild.members.insert(member.id(), member.clone());
        (member, old)
    });
    let Some((member, old)) = updated else {
        router.dropped(EVENT, "guild_not_cached", guild_id);
        return;
    };

    let old_nickname = old.as_ref().and_then(|m| m.nickname.clone());
    if old_nickname != member.nickname {
        router.emit(BotEvent::NicknameUpdate {
            member: member.clone(),
            nickname: member.nickname.clone(),
            old: old_nickname,
        });
    }

    let old_roles = old.as_ref().map(|m| m.role_ids.as_slice()).unwrap_or_default();
    for role_id in old_roles.iter().filter(|id| !member.has_role(**id)) {
        router.emit(BotEvent::RoleLost {
            member: member.clone(),
            role_id: *role_id,
        });
    }
    for role_id in member.role_ids.iter().filter(|id| !old_roles.contains(id)) {
        router.emit(BotEvent::RoleGained {
            member: member.clone(),
            role_id: *role_id,
        });
    }

    router.emit(BotEvent::GuildMemberUpdate { member, old });
}

pub(super) fn members_chunk(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::GuildMembersChunk;
    let Some(chunk) = router.decode::<MembersChunkPayload>(EVENT, data) else {
        return;
    };
    let MembersChunkPayload {
        guild_id,
        members,
        chunk_index,
        chunk_count,
        nonce,
    } = chunk;

    let count = members.len();
    let stored = router.cache().update_guild(guild_id, |guild| {
        for mut member in members {
            member.guild_id = guild_id;
            guild.members.insert(member.id(), member);
        }
    });
    if stored.is_none() {
        router.dropped(EVENT, "guild_not_cached", guild_id);
    }
    tracing::debug!(guild_id = %guild_id, chunk_index, chunk_count, count, "Member chunk received");

    // The waiter completes even when the guild vanished meanwhile
    if let Some(nonce) = nonce {
        if chunk_index.checked_add(1) == Some(chunk_count) {
            router.chunks().complete(&nonce);
        }
    }
}
