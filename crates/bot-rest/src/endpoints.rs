//! REST paths, relative to the API base

use bot_core::Snowflake;

pub fn gateway_bot() -> String {
    "/gateway/bot".to_string()
}

pub fn channel(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}")
}

pub fn channel_messages(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/messages")
}

pub fn channel_message(channel_id: Snowflake, message_id: Snowflake) -> String {
    format!("/channels/{channel_id}/messages/{message_id}")
}

pub fn channel_webhooks(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/webhooks")
}

pub fn guild_member(guild_id: Snowflake, user_id: Snowflake) -> String {
    format!("/guilds/{guild_id}/members/{user_id}")
}

pub fn webhook(webhook_id: Snowflake) -> String {
    format!("/webhooks/{webhook_id}")
}

/// Execute path; authenticated by the webhook token instead of the bot token
pub fn webhook_execute(webhook_id: Snowflake, token: &str) -> String {
    format!("/webhooks/{webhook_id}/{token}")
}
