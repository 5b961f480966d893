//! Command services of a connected client
//!
//! Permission checks run against the gateway-fed cache; a refused command
//! never reaches the transport.

use bot_common::AppError;
use bot_core::{DomainError, Permissions, Snowflake};
use bot_gateway::EventKind;
use bot_service::CreateMessageRequest;
use integration_tests::fixtures::{self, BOT, GENERAL, GUILD, MEMBER, OWNER, READ_ONLY};
use integration_tests::helpers::{connect_bot, EventRecorder, TestBot};
use serde_json::json;

fn id(raw: u64) -> Snowflake {
    Snowflake::new(raw)
}

async fn seeded() -> (TestBot, EventRecorder) {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::MessageCreate])).await.unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();
    (bot, recorder)
}

fn missing_permission(err: &AppError) -> bool {
    matches!(err, AppError::Domain(DomainError::MissingPermission(_)))
}

#[tokio::test]
async fn test_send_message_posts_body() {
    let (bot, _) = seeded().await;
    let message_id = fixtures::unique_id();
    bot.transport.respond_to(
        "/channels/10/messages",
        200,
        fixtures::message(message_id, GENERAL, BOT, "hello there"),
    );

    let sent = bot
        .client
        .messages()
        .send_message(id(GENERAL), CreateMessageRequest::text("hello there"))
        .await
        .unwrap();

    assert_eq!(sent.id, id(message_id));
    let calls = bot.transport.calls_to("/channels/10/messages");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].body.as_ref().unwrap()["content"], "hello there");
}

#[tokio::test]
async fn test_send_message_refused_without_network_call() {
    let (bot, _) = seeded().await;

    let err = bot
        .client
        .messages()
        .send_message(id(READ_ONLY), CreateMessageRequest::text("let me in"))
        .await
        .unwrap_err();

    assert!(missing_permission(&err), "unexpected error {err:?}");
    assert!(bot.transport.calls_to("/channels/13/messages").is_empty());
}

#[tokio::test]
async fn test_tts_needs_its_own_permission() {
    let (bot, _) = seeded().await;

    let request = CreateMessageRequest {
        tts: true,
        ..CreateMessageRequest::text("read aloud")
    };
    let err = bot.client.messages().send_message(id(GENERAL), request).await.unwrap_err();

    assert!(missing_permission(&err));
    assert!(bot.transport.calls_to("/channels/10/messages").is_empty());
}

#[tokio::test]
async fn test_kick_refused_without_network_call() {
    let (bot, _) = seeded().await;

    let err = bot
        .client
        .members()
        .kick_member(id(GUILD), id(MEMBER), Some("spam"))
        .await
        .unwrap_err();

    assert!(missing_permission(&err));
    assert!(bot.transport.calls_to("/guilds/1/members/300").is_empty());
}

#[tokio::test]
async fn test_delete_own_message() {
    let (bot, mut recorder) = seeded().await;
    let message_id = fixtures::unique_id();
    bot.gateway
        .dispatch(0, "MESSAGE_CREATE", fixtures::message(message_id, GENERAL, BOT, "oops"))
        .await
        .unwrap();
    bot.gateway.flush(0, &mut recorder).await.unwrap();

    bot.client
        .messages()
        .delete_message(id(GENERAL), id(message_id), Some("typo"))
        .await
        .unwrap();

    let calls = bot.transport.calls_to(&format!("/channels/10/messages/{message_id}"));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "DELETE");
    assert_eq!(calls[0].audit_reason.as_deref(), Some("typo"));
}

#[tokio::test]
async fn test_upstream_error_is_returned() {
    let (bot, _) = seeded().await;
    bot.transport
        .respond_to("/channels/10/messages", 403, json!({"message": "Missing Access", "code": 50001}));

    let err = bot
        .client
        .messages()
        .send_message(id(GENERAL), CreateMessageRequest::text("hi"))
        .await
        .unwrap_err();

    match err {
        AppError::ClientError { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Missing Access");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_get_member_fills_cache() {
    let (bot, _) = seeded().await;
    bot.transport
        .respond_to("/guilds/1/members/555", 200, fixtures::member(555, &[]));

    let member = bot.client.members().get_member(id(GUILD), id(555)).await.unwrap();

    assert_eq!(member.id(), id(555));
    assert_eq!(member.guild_id, id(GUILD));
    assert!(bot.client.cache().get_member(id(GUILD), id(555)).is_some());
}

#[tokio::test]
async fn test_owner_cannot_be_kicked() {
    let (bot, mut recorder) = seeded().await;
    let role = fixtures::role(fixtures::R1, 3, fixtures::r1_permissions() | Permissions::KICK_MEMBERS);
    bot.gateway
        .dispatch(0, "GUILD_ROLE_UPDATE", json!({"guild_id": GUILD.to_string(), "role": role}))
        .await
        .unwrap();
    bot.gateway.flush(0, &mut recorder).await.unwrap();

    let err = bot
        .client
        .members()
        .kick_member(id(GUILD), id(OWNER), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Domain(DomainError::CannotKickOwner)));
    assert!(bot.transport.calls_to("/guilds/1/members/100").is_empty());
}
