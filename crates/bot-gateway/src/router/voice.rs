//! Voice state dispatches

use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType};
use bot_core::{GuildMember, VoiceState};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct VoiceStatePayload {
    #[serde(flatten)]
    state: VoiceState,
    #[serde(default)]
    member: Option<GuildMember>,
}

pub(super) fn voice_state_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::VoiceStateUpdate;
    let Some(VoiceStatePayload { state, member }) = router.decode(EVENT, data) else {
        return;
    };
    let Some(guild_id) = state.guild_id else {
        router.dropped(EVENT, "no_guild", state.user_id);
        return;
    };

    let applied = router.cache().update_guild(guild_id, |guild| {
        let member = match guild.members.get(&state.user_id) {
            Some(cached) => cached.clone(),
            None => {
                let mut member = member?;
                member.guild_id = guild_id;
                guild.members.insert(member.id(), member.clone());
                member
            }
        };
        let previous = match state.channel_id {
            Some(_) => guild.voice_states.insert(state.user_id, state.clone()),
            None => guild.voice_states.remove(&state.user_id),
        };
        Some((member, previous.and_then(|s| s.channel_id)))
    });
    let (member, old_channel_id) = match applied {
        Some(Some(applied)) => applied,
        Some(None) => {
            router.dropped(EVENT, "member_not_cached", state.user_id);
            return;
        }
        None => {
            router.dropped(EVENT, "guild_not_cached", guild_id);
            return;
        }
    };

    match (old_channel_id, state.channel_id) {
        (None, Some(channel_id)) => router.emit(BotEvent::VoiceChannelJoin {
            member: member.clone(),
            channel_id,
        }),
        (Some(channel_id), None) => router.emit(BotEvent::VoiceChannelLeave {
            member: member.clone(),
            channel_id,
        }),
        (Some(old_channel_id), Some(channel_id)) if old_channel_id != channel_id => {
            router.emit(BotEvent::VoiceChannelSwitch {
                member: member.clone(),
                channel_id,
                old_channel_id,
            });
        }
        _ => {}
    }
    router.emit(BotEvent::VoiceStateUpdate { member, state });
}
