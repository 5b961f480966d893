//! Message and reaction dispatches

use super::ShardRouter;
use crate::events::{BotEvent, GatewayEventType, MessageSnapshot, ReactionEvent};
use bot_common::MessageUpdatePolicy;
use bot_core::{Attachment, GuildMember, Message, ReactionEmoji, Snowflake, User};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Member objects riding along a MESSAGE_CREATE
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MemberHints {
    member: Option<GuildMember>,
    mentions: Vec<MentionHint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MentionHint {
    id: Snowflake,
    member: Option<GuildMember>,
}

#[derive(Debug, Deserialize)]
struct MessageDeletePayload {
    id: Snowflake,
    channel_id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct MessageDeleteBulkPayload {
    ids: Vec<Snowflake>,
    channel_id: Snowflake,
}

/// Partial message: only the fields present are applied
#[derive(Debug, Deserialize)]
struct MessageUpdatePayload {
    id: Snowflake,
    channel_id: Snowflake,
    #[serde(default)]
    edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    embeds: Option<Vec<Value>>,
    #[serde(default)]
    mentions: Option<Vec<User>>,
    #[serde(default)]
    mention_roles: Option<Vec<Snowflake>>,
    #[serde(default)]
    mention_everyone: Option<bool>,
    #[serde(default)]
    tts: Option<bool>,
    #[serde(default)]
    pinned: Option<bool>,
}

impl MessageUpdatePayload {
    fn apply(self, message: &mut Message) {
        message.edited_timestamp = self.edited_timestamp;
        if let Some(content) = self.content {
            message.content = content;
        }
        if let Some(attachments) = self.attachments {
            message.attachments = attachments;
        }
        if let Some(embeds) = self.embeds {
            message.embeds = embeds;
        }
        if let Some(mentions) = self.mentions {
            message.mentions = mentions;
        }
        if let Some(mention_roles) = self.mention_roles {
            message.mention_roles = mention_roles;
        }
        if let Some(mention_everyone) = self.mention_everyone {
            message.mention_everyone = mention_everyone;
        }
        if let Some(tts) = self.tts {
            message.tts = tts;
        }
        if let Some(pinned) = self.pinned {
            message.pinned = pinned;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReactionPayload {
    user_id: Snowflake,
    channel_id: Snowflake,
    message_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    #[serde(default)]
    member: Option<GuildMember>,
    emoji: ReactionEmoji,
}

#[derive(Debug, Deserialize)]
struct ReactionClearPayload {
    message_id: Snowflake,
    #[serde(default)]
    emoji: Option<ReactionEmoji>,
}

pub(super) fn message_create(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageCreate;
    let hints = MemberHints::deserialize(&data).unwrap_or_default();
    let Some(message) = router.decode::<Message>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    cache.update_channel(message.channel_id, |channel| channel.last_message_id = Some(message.id));

    if let Some(guild_id) = message.guild_id {
        if let Some(mut member) = hints.member {
            member.user = message.author.clone();
            cache.upsert_member(guild_id, member);
        }
        for mention in hints.mentions {
            let Some(mut member) = mention.member else {
                continue;
            };
            if let Some(user) = message.mentions.iter().find(|u| u.id == mention.id) {
                member.user = user.clone();
                cache.upsert_member(guild_id, member);
            }
        }
    }

    cache.insert_message(message.clone());
    router.emit(BotEvent::MessageCreate(message));
}

pub(super) fn message_delete(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageDelete;
    if let Some(MessageDeletePayload { id, channel_id }) = router.decode(EVENT, data) {
        delete_messages(router, EVENT, channel_id, vec![id]);
    }
}

pub(super) fn message_delete_bulk(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageDeleteBulk;
    if let Some(MessageDeleteBulkPayload { ids, channel_id }) = router.decode(EVENT, data) {
        delete_messages(router, EVENT, channel_id, ids);
    }
}

fn delete_messages(router: &ShardRouter, event: GatewayEventType, channel_id: Snowflake, ids: Vec<Snowflake>) {
    let cache = router.cache();
    if !cache.contains_channel(channel_id) {
        router.dropped(event, "channel_not_cached", channel_id);
        return;
    }
    for id in ids {
        if let Some(message) = cache.remove_message(id) {
            router.emit(BotEvent::MessageDelete(message));
        }
    }
}

pub(super) fn message_update(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageUpdate;
    let Some(payload) = router.decode::<MessageUpdatePayload>(EVENT, data) else {
        return;
    };
    let cache = router.cache();

    if !cache.contains_channel(payload.channel_id) {
        router.dropped(EVENT, "channel_not_cached", payload.channel_id);
        return;
    }
    let Some(cached) = cache.get_message(payload.id) else {
        router.dropped(EVENT, "message_not_cached", payload.id);
        return;
    };
    // Embed unfurls arrive as updates without an edit timestamp
    if payload.edited_timestamp.is_none() {
        router.dropped(EVENT, "not_edited", payload.id);
        return;
    }
    if router.message_update_policy() == MessageUpdatePolicy::Legacy
        && payload.content.as_deref() != Some(cached.content.as_str())
    {
        router.dropped(EVENT, "content_changed", payload.id);
        return;
    }

    let old = MessageSnapshot::from(&cached);
    let id = payload.id;
    let Some(message) = cache.update_message(id, |message| {
        payload.apply(message);
        message.clone()
    }) else {
        return;
    };
    router.emit(BotEvent::MessageUpdate { message, old });
}

pub(super) fn reaction_add(router: &ShardRouter, _shard_id: u32, data: Value) {
    if let Some(payload) = router.decode(GatewayEventType::MessageReactionAdd, data) {
        let event = apply_reaction(router, payload, true);
        router.emit(BotEvent::ReactionAdd(event));
    }
}

pub(super) fn reaction_remove(router: &ShardRouter, _shard_id: u32, data: Value) {
    if let Some(payload) = router.decode(GatewayEventType::MessageReactionRemove, data) {
        let event = apply_reaction(router, payload, false);
        router.emit(BotEvent::ReactionRemove(event));
    }
}

fn apply_reaction(router: &ShardRouter, payload: ReactionPayload, added: bool) -> ReactionEvent {
    let cache = router.cache();
    let me = cache.is_bot(payload.user_id);

    let message = cache.update_message(payload.message_id, |message| {
        if added {
            message.add_reaction(&payload.emoji, me);
        } else {
            message.remove_reaction(&payload.emoji, me);
        }
        message.clone()
    });

    if let (Some(guild_id), Some(member)) = (payload.guild_id, payload.member) {
        cache.upsert_member(guild_id, member);
    }

    ReactionEvent {
        message,
        message_id: payload.message_id,
        channel_id: payload.channel_id,
        guild_id: payload.guild_id,
        user_id: payload.user_id,
        emoji: payload.emoji,
    }
}

pub(super) fn reaction_remove_all(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageReactionRemoveAll;
    let Some(payload) = router.decode::<ReactionClearPayload>(EVENT, data.clone()) else {
        return;
    };
    router
        .cache()
        .update_message(payload.message_id, |message| message.reactions.clear());
    router.emit(BotEvent::ReactionRemoveAll(data));
}

pub(super) fn reaction_remove_emoji(router: &ShardRouter, _shard_id: u32, data: Value) {
    const EVENT: GatewayEventType = GatewayEventType::MessageReactionRemoveEmoji;
    let Some(payload) = router.decode::<ReactionClearPayload>(EVENT, data.clone()) else {
        return;
    };
    if let Some(emoji) = &payload.emoji {
        router
            .cache()
            .update_message(payload.message_id, |message| message.clear_emoji(emoji));
    }
    router.emit(BotEvent::ReactionRemoveEmoji(data));
}
