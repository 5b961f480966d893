//! Shared fixtures for service tests

use async_trait::async_trait;
use bot_cache::EntityCache;
use bot_common::{AppResult, RestConfig};
use bot_core::{Channel, Guild, GuildMember, Permissions, Role, Snowflake, User};
use bot_rest::{HttpTransport, PreparedRequest, RawResponse, RestClient};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::ServiceContext;

pub const GUILD: Snowflake = Snowflake::new(1);
pub const CHANNEL: Snowflake = Snowflake::new(10);
pub const OWNER: Snowflake = Snowflake::new(100);
pub const BOT: Snowflake = Snowflake::new(200);
pub const MEMBER: Snowflake = Snowflake::new(300);

/// Records requests and answers from a queue of canned responses
#[derive(Default)]
pub struct RecordingTransport {
    pub responses: Mutex<VecDeque<RawResponse>>,
    pub requests: Mutex<Vec<PreparedRequest>>,
}

impl RecordingTransport {
    pub fn respond(&self, status: u16, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(RawResponse::new(status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: PreparedRequest) -> AppResult<RawResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| RawResponse::new(204, "")))
    }
}

/// Guild with the bot holding `bot_permissions` and one plain member
pub fn context(bot_permissions: Permissions) -> (ServiceContext, Arc<RecordingTransport>) {
    let cache = EntityCache::new_shared();
    let mut guild = Guild::new(GUILD, "Guild", OWNER);
    guild.roles.insert(GUILD, Role::everyone(GUILD, Permissions::VIEW_CHANNEL));

    let mut bot_role = Role::new(Snowflake::new(50), "bot", bot_permissions);
    bot_role.position = 5;
    guild.roles.insert(bot_role.id, bot_role);

    let mut bot = GuildMember::new(GUILD, User::new(BOT, "bot", "0001"));
    bot.add_role(Snowflake::new(50));
    guild.members.insert(BOT, bot);
    guild
        .members
        .insert(MEMBER, GuildMember::new(GUILD, User::new(MEMBER, "member", "0002")));
    guild
        .members
        .insert(OWNER, GuildMember::new(GUILD, User::new(OWNER, "owner", "0003")));

    cache.insert_guild(guild);
    cache.insert_channel(Channel::new_text(CHANNEL, GUILD, "general"));
    cache.set_bot_id(BOT);

    let transport = Arc::new(RecordingTransport::default());
    let rest = RestClient::new(&RestConfig::default(), "token", Arc::clone(&transport) as Arc<dyn HttpTransport>);
    (ServiceContext::new(cache, Arc::new(rest)), transport)
}
