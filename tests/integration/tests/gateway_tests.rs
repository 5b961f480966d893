//! Gateway integration tests
//!
//! A full client over in-memory shards: bootstrap, cache maintenance and
//! gateway commands.

use std::time::Duration;

use bot_cache::EntityCache;
use bot_core::Snowflake;
use bot_gateway::{Activity, ActivityType, BotEvent, EventKind, OpCode, ShardState, StatusType};
use integration_tests::fixtures::{self, ANNOUNCEMENTS, BOT, GENERAL, GUILD, MEMBER, R1};
use integration_tests::helpers::{connect_bot, connect_bot_with, test_config_with, EventRecorder};
use serde_json::json;

fn id(raw: u64) -> Snowflake {
    Snowflake::new(raw)
}

/// Guild and channel counts held by the cache
fn cache_sizes(cache: &EntityCache) -> (usize, usize) {
    (cache.guild_count(), cache.channel_count())
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_connect_starts_recommended_shards_in_sequence() {
    let bot = connect_bot(2, bot_gateway::EventHandlers::new()).await.unwrap();

    let identifies = bot.gateway.identifies();
    assert_eq!(identifies.len(), 2);
    assert_eq!((identifies[0].shard_id(), identifies[0].shard_count()), (0, 2));
    assert_eq!((identifies[1].shard_id(), identifies[1].shard_count()), (1, 2));

    let times = bot.gateway.connect_times();
    assert!(times[1] - times[0] >= Duration::from_secs(5));

    let manager = bot.client.manager();
    assert_eq!(manager.shard_count(), 2);
    assert_eq!(manager.shard_state(0), Some(ShardState::Identified));
    assert_eq!(manager.shard_state(1), Some(ShardState::Identified));

    assert_eq!(bot.client.cache().bot_id(), Some(id(BOT)));
    assert!(bot.client.cache().is_unavailable(id(GUILD)));
    assert_eq!(bot.client.gateway_info().url, "wss://gateway.test");
    assert_eq!(bot.transport.calls_to("/gateway/bot").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_shard_count_wins() {
    let config = test_config_with(&[("BOT_SHARD_COUNT", "1")]).unwrap();
    let bot = connect_bot_with(&config, 3, bot_gateway::EventHandlers::new())
        .await
        .unwrap();

    assert_eq!(bot.gateway.shard_count(), 1);
    assert_eq!(bot.client.manager().shard_count(), 1);
}

#[tokio::test]
async fn test_ready_event_reaches_handler() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::Ready])).await.unwrap();

    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();
    let [BotEvent::Ready { shard_id, user, .. }] = events.as_slice() else {
        panic!("expected one ready event, got {events:?}");
    };
    assert_eq!(*shard_id, 0);
    assert_eq!(user.id, id(BOT));
}

// ============================================================================
// Cache maintenance
// ============================================================================

#[tokio::test]
async fn test_guild_create_is_cached_once() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::GuildCreate])).await.unwrap();

    let events = bot.seed_guild(&mut recorder).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(!bot.client.cache().is_unavailable(id(GUILD)));

    let mut replay = fixtures::guild_create();
    replay["name"] = json!("Renamed");
    replay["members"] = json!([]);
    bot.gateway.dispatch(0, "GUILD_CREATE", replay).await.unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    assert!(events.is_empty());
    let (name, members) = bot
        .client
        .cache()
        .with_guild(id(GUILD), |g| (g.name.clone(), g.members.len()))
        .unwrap();
    assert_eq!(name, "Integration Guild");
    assert_eq!(members, 4);
}

#[tokio::test]
async fn test_role_create_then_update() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::RoleCreate, EventKind::RoleUpdate]))
        .await
        .unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();

    let mut role = fixtures::role(77, 4, fixtures::r1_permissions());
    bot.gateway
        .dispatch(0, "GUILD_ROLE_CREATE", json!({"guild_id": GUILD.to_string(), "role": role}))
        .await
        .unwrap();
    role["name"] = json!("moderators");
    bot.gateway
        .dispatch(0, "GUILD_ROLE_UPDATE", json!({"guild_id": GUILD.to_string(), "role": role}))
        .await
        .unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], BotEvent::RoleCreate { role, .. } if role.name == "role77"));
    let BotEvent::RoleUpdate { role, old, .. } = &events[1] else {
        panic!("expected role update, got {:?}", events[1]);
    };
    assert_eq!(role.name, "moderators");
    assert_eq!(old.name, "role77");

    let cached = bot
        .client
        .cache()
        .with_guild(id(GUILD), |g| g.roles.get(&id(77)).map(|r| r.name.clone()))
        .flatten();
    assert_eq!(cached.as_deref(), Some("moderators"));
}

#[tokio::test]
async fn test_bulk_delete_emits_for_cached_messages_only() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::MessageCreate, EventKind::MessageDelete]))
        .await
        .unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();

    let (first, second, unknown) = (fixtures::unique_id(), fixtures::unique_id(), fixtures::unique_id());
    for message_id in [first, second] {
        bot.gateway
            .dispatch(0, "MESSAGE_CREATE", fixtures::message(message_id, GENERAL, MEMBER, "hello"))
            .await
            .unwrap();
    }
    let created = bot.gateway.flush(0, &mut recorder).await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(bot.client.cache().message_count(), 2);

    bot.gateway
        .dispatch(
            0,
            "MESSAGE_DELETE_BULK",
            json!({
                "ids": [first.to_string(), second.to_string(), unknown.to_string()],
                "channel_id": GENERAL.to_string(),
                "guild_id": GUILD.to_string()
            }),
        )
        .await
        .unwrap();
    let deleted = bot.gateway.flush(0, &mut recorder).await.unwrap();

    let ids: Vec<Snowflake> = deleted
        .iter()
        .map(|event| match event {
            BotEvent::MessageDelete(message) => message.id,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec![id(first), id(second)]);
    assert_eq!(bot.client.cache().message_count(), 0);
}

#[tokio::test]
async fn test_member_role_changes_emit_in_order() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(
        1,
        recorder.handlers(&[EventKind::RoleGained, EventKind::RoleLost, EventKind::GuildMemberUpdate]),
    )
    .await
    .unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();

    bot.gateway
        .dispatch(0, "GUILD_MEMBER_UPDATE", fixtures::member(MEMBER, &[]))
        .await
        .unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    let kinds: Vec<EventKind> = events.iter().map(BotEvent::kind).collect();
    assert_eq!(kinds, vec![EventKind::RoleLost, EventKind::GuildMemberUpdate]);
    assert!(matches!(&events[0], BotEvent::RoleLost { role_id, .. } if *role_id == id(R1)));

    let member = bot.client.cache().get_member(id(GUILD), id(MEMBER)).unwrap();
    assert!(!member.has_role(id(R1)));
}

#[tokio::test]
async fn test_channel_delete_drops_its_messages() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::ChannelDelete])).await.unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();

    let message_id = fixtures::unique_id();
    bot.gateway
        .dispatch(0, "MESSAGE_CREATE", fixtures::message(message_id, ANNOUNCEMENTS, MEMBER, "news"))
        .await
        .unwrap();
    bot.gateway
        .dispatch(0, "CHANNEL_DELETE", fixtures::text_channel(ANNOUNCEMENTS, "announcements", vec![]))
        .await
        .unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    assert_eq!(events.len(), 1);
    assert!(!bot.client.cache().contains_channel(id(ANNOUNCEMENTS)));
    assert!(!bot.client.cache().contains_message(id(message_id)));
}

#[tokio::test(start_paused = true)]
async fn test_channel_create_for_unknown_guild_is_ignored() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::ChannelCreate])).await.unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();
    let before = cache_sizes(bot.client.cache());

    let stray = fixtures::unique_id();
    let mut channel = fixtures::text_channel(stray, "elsewhere", vec![]);
    channel["guild_id"] = json!("999");
    bot.gateway.dispatch(0, "CHANNEL_CREATE", channel).await.unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    assert!(events.is_empty());
    assert!(!bot.client.cache().contains_channel(id(stray)));
    assert_eq!(cache_sizes(bot.client.cache()), before);

    let created = fixtures::unique_id();
    bot.gateway
        .dispatch(0, "CHANNEL_CREATE", fixtures::text_channel(created, "fresh", vec![]))
        .await
        .unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(cache_sizes(bot.client.cache()), (before.0, before.1 + 1));
}

// ============================================================================
// Gateway commands
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_status_update_is_sent_to_every_shard() {
    let bot = connect_bot(2, bot_gateway::EventHandlers::new()).await.unwrap();

    let delivered = bot
        .client
        .manager()
        .edit_bot_status(StatusType::Dnd, Some(Activity::new("tests", ActivityType::Game)))
        .await;
    assert_eq!(delivered, 2);

    for shard_id in 0..2 {
        let frames = bot.gateway.sent_frames(shard_id);
        let status = frames
            .iter()
            .find_map(|frame| frame.as_status_update())
            .expect("status update frame");
        assert_eq!(status.status, StatusType::Dnd);
        assert_eq!(status.game.map(|g| g.name).as_deref(), Some("tests"));
    }
}

#[tokio::test]
async fn test_request_all_members_completes_on_last_chunk() {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[])).await.unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();

    let done = bot.client.manager().request_all_members(id(GUILD)).await.unwrap();

    let frames = bot.gateway.sent_frames(0);
    let request = frames
        .iter()
        .filter(|frame| frame.op == OpCode::RequestGuildMembers)
        .find_map(|frame| frame.as_request_guild_members())
        .expect("request guild members frame");
    assert_eq!(request.guild_id, id(GUILD));
    let nonce = request.nonce.expect("nonce");

    for (index, user_id) in [(0, 400_u64), (1, 401)] {
        bot.gateway
            .dispatch(
                0,
                "GUILD_MEMBERS_CHUNK",
                json!({
                    "guild_id": GUILD.to_string(),
                    "members": [fixtures::member(user_id, &[])],
                    "chunk_index": index,
                    "chunk_count": 2,
                    "nonce": nonce
                }),
            )
            .await
            .unwrap();
    }

    tokio::time::timeout(Duration::from_secs(5), done)
        .await
        .expect("chunk request completed")
        .unwrap();
    assert!(bot.client.cache().get_member(id(GUILD), id(400)).is_some());
    assert!(bot.client.cache().get_member(id(GUILD), id(401)).is_some());
    assert!(bot.client.manager().chunks().is_empty());
}

#[tokio::test]
async fn test_request_members_of_unknown_guild_fails() {
    let bot = connect_bot(1, bot_gateway::EventHandlers::new()).await.unwrap();

    let err = bot.client.manager().request_all_members(id(999)).await.unwrap_err();
    assert!(matches!(err, bot_gateway::GatewayError::GuildNotCached(guild) if guild == id(999)));
}
