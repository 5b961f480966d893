//! Channel and webhook dispatches

use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType};
use bot_core::{Channel, Snowflake};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct WebhooksUpdatePayload {
    channel_id: Snowflake,
    guild_id: Snowflake,
}

pub(super) fn channel_create(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::ChannelCreate;
    let Some(channel) = router.decode::<Channel>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    if let Some(guild_id) = channel.guild_id {
        if cache.update_guild(guild_id, |guild| guild.add_channel(channel.id)).is_none() {
            router.dropped(EVENT, "guild_not_cached", guild_id);
            return;
        }
    }
    cache.insert_channel(channel.clone());

    tracing::debug!(channel_id = %channel.id, guild_id = ?channel.guild_id, "Channel cached");
    router.emit(BotEvent::ChannelCreate(channel));
}

pub(super) fn channel_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::ChannelUpdate;
    let Some(channel) = router.decode::<Channel>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    let Some(old) = cache.get_channel(channel.id) else {
        router.dropped(EVENT, "channel_not_cached", channel.id);
        return;
    };
    cache.insert_channel(channel.clone());
    router.emit(BotEvent::ChannelUpdate { channel, old });
}

pub(super) fn channel_delete(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::ChannelDelete;
    let Some(channel) = router.decode::<Channel>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    let Some(removed) = cache.remove_channel(channel.id) else {
        router.dropped(EVENT, "channel_not_cached", channel.id);
        return;
    };
    if let Some(guild_id) = removed.guild_id {
        cache.update_guild(guild_id, |guild| {
            guild.remove_channel(removed.id);
            guild
                .voice_states
                .retain(|_, state| state.channel_id != Some(removed.id));
        });
    }

    tracing::debug!(channel_id = %removed.id, "Channel removed");
    router.emit(BotEvent::ChannelDelete(removed));
}

pub(super) fn webhooks_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    if let Some(WebhooksUpdatePayload { channel_id, guild_id }) =
        router.decode(GatewayEventType::WebhooksUpdate, data)
    {
        router.emit(BotEvent::WebhooksUpdate { channel_id, guild_id });
    }
}
