//! Permission resolution against a guild streamed in over the gateway

use bot_core::{Permissions, Snowflake};
use bot_gateway::EventKind;
use integration_tests::fixtures::{
    self, ANNOUNCEMENTS, BOT, GENERAL, GUEST, GUILD, MEMBER, MUTED, OWNER, R1, READ_ONLY,
};
use integration_tests::helpers::{connect_bot, EventRecorder, TestBot};
use serde_json::json;

fn id(raw: u64) -> Snowflake {
    Snowflake::new(raw)
}

async fn seeded() -> (TestBot, EventRecorder) {
    let mut recorder = EventRecorder::default();
    let bot = connect_bot(1, recorder.handlers(&[EventKind::RoleUpdate])).await.unwrap();
    bot.seed_guild(&mut recorder).await.unwrap();
    (bot, recorder)
}

#[tokio::test]
async fn test_guild_permissions_combine_roles() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert_eq!(
        resolver.effective_guild_permissions(id(MEMBER), id(GUILD)),
        fixtures::everyone_permissions() | fixtures::r1_permissions()
    );
    assert_eq!(
        resolver.effective_guild_permissions(id(GUEST), id(GUILD)),
        fixtures::everyone_permissions()
    );
    assert_eq!(resolver.effective_guild_permissions(id(OWNER), id(GUILD)), Permissions::ALL);
    assert!(resolver.effective_guild_permissions(id(999), id(GUILD)).is_empty());

    assert!(resolver.bot_has_guild_permissions(id(GUILD), Permissions::MANAGE_MESSAGES));
    assert!(!resolver.bot_has_guild_permissions(id(GUILD), Permissions::KICK_MEMBERS));
}

#[tokio::test]
async fn test_member_deny_beats_role_allow() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert!(!resolver.has_channel_permissions(id(MUTED), id(MEMBER), Permissions::SEND_MESSAGES));
    // The bot holds the same role without a member overwrite
    assert!(resolver.has_channel_permissions(id(MUTED), id(BOT), Permissions::SEND_MESSAGES));
}

#[tokio::test]
async fn test_role_allow_beats_everyone_deny() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert!(resolver.has_channel_permissions(id(ANNOUNCEMENTS), id(MEMBER), Permissions::SEND_MESSAGES));
    assert!(!resolver.has_channel_permissions(id(ANNOUNCEMENTS), id(GUEST), Permissions::SEND_MESSAGES));
    assert!(resolver.has_channel_permissions(id(ANNOUNCEMENTS), id(GUEST), Permissions::VIEW_CHANNEL));
}

#[tokio::test]
async fn test_everyone_deny_without_allow() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert!(!resolver.has_channel_permissions(id(READ_ONLY), id(MEMBER), Permissions::SEND_MESSAGES));
    assert!(!resolver.bot_has_channel_permissions(id(READ_ONLY), Permissions::SEND_MESSAGES));
    assert!(resolver.has_channel_permissions(id(GENERAL), id(GUEST), Permissions::SEND_MESSAGES));
}

#[tokio::test]
async fn test_owner_passes_every_channel() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    for channel in [GENERAL, ANNOUNCEMENTS, MUTED, READ_ONLY] {
        assert!(resolver.has_channel_permissions(id(channel), id(OWNER), Permissions::ALL));
    }
}

#[tokio::test]
async fn test_unknown_channel_or_member_is_denied() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert!(!resolver.has_channel_permissions(id(404), id(OWNER), Permissions::VIEW_CHANNEL));
    assert!(!resolver.has_channel_permissions(id(GENERAL), id(999), Permissions::VIEW_CHANNEL));
}

#[tokio::test]
async fn test_bot_administrator_bypasses_overwrites() {
    let (bot, mut recorder) = seeded().await;

    let admin = fixtures::r1_permissions() | Permissions::ADMINISTRATOR;
    bot.gateway
        .dispatch(
            0,
            "GUILD_ROLE_UPDATE",
            json!({"guild_id": GUILD.to_string(), "role": fixtures::role(R1, 3, admin)}),
        )
        .await
        .unwrap();
    let events = bot.gateway.flush(0, &mut recorder).await.unwrap();
    assert_eq!(events.len(), 1);

    let resolver = bot.client.services().permissions();
    assert_eq!(resolver.effective_guild_permissions(id(BOT), id(GUILD)), Permissions::ALL);
    assert!(resolver.bot_has_channel_permissions(id(READ_ONLY), Permissions::SEND_MESSAGES));
    assert!(resolver.bot_has_guild_permissions(id(GUILD), Permissions::KICK_MEMBERS));
}

#[tokio::test]
async fn test_role_hierarchy() {
    let (bot, _) = seeded().await;
    let resolver = bot.client.services().permissions();

    assert_eq!(resolver.highest_role(id(GUILD), id(MEMBER)).map(|r| r.id), Some(id(R1)));
    assert_eq!(resolver.highest_role(id(GUILD), id(GUEST)).map(|r| r.id), Some(id(GUILD)));
    assert!(resolver.highest_role(id(GUILD), id(999)).is_none());

    assert_eq!(resolver.higher_role_position(id(GUILD), id(R1), id(GUILD)), Some(true));
    assert_eq!(resolver.higher_role_position(id(GUILD), id(GUILD), id(R1)), Some(false));
    assert_eq!(resolver.higher_role_position(id(GUILD), id(R1), id(12345)), None);
}
