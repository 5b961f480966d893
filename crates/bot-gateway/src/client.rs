//! Bot client
//!
//! Wires the cache, the REST client, the router and the shard manager
//! together and hands out the command services.

use crate::error::GatewayResult;
use crate::events::EventHandlers;
use crate::protocol::{GatewayBotInfo, IdentifyPayload};
use crate::router::ShardRouter;
use crate::shard::{ShardConnector, ShardManager, ShardSettings};
use bot_cache::EntityCache;
use bot_common::AppConfig;
use bot_rest::{decode, endpoints, HttpTransport, ReqwestTransport, RestClient};
use bot_service::{MemberService, MessageService, ServiceContext, WebhookService};
use std::sync::Arc;

pub struct BotClient {
    services: ServiceContext,
    manager: ShardManager,
    gateway: GatewayBotInfo,
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("gateway", &self.gateway.url)
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl BotClient {
    /// Fetch gateway info, then bring every shard up
    ///
    /// Returns once all shards received READY. The shard count comes from
    /// the config when set, from the gateway endpoint otherwise.
    pub async fn connect(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
        connector: Arc<dyn ShardConnector>,
        handlers: EventHandlers,
    ) -> GatewayResult<Self> {
        let cache = EntityCache::new_shared();
        let rest = Arc::new(RestClient::with_debug_hook(
            &config.rest,
            &config.bot.token,
            transport,
            handlers.debug_hook().cloned(),
        ));

        let gateway: GatewayBotInfo = decode(rest.get(&endpoints::gateway_bot(), None).await?)?;
        let shard_count = config.bot.shard_count.unwrap_or(gateway.shards).max(1);
        tracing::info!(
            url = %gateway.url,
            recommended = gateway.shards,
            shard_count,
            "Gateway information fetched"
        );

        let identify = IdentifyPayload::new(config.bot.token.clone(), config.bot.intents, shard_count)
            .with_compress(config.gateway.compress);
        let router = ShardRouter::new(Arc::clone(&cache), handlers)
            .with_message_update_policy(config.gateway.message_update_policy);
        let manager = ShardManager::new(
            router,
            connector,
            ShardSettings {
                gateway_url: gateway.url.clone(),
                identify,
                cooldown: config.gateway.shard_cooldown,
                frame_buffer: config.gateway.frame_buffer,
            },
        );
        manager.start().await?;

        Ok(Self {
            services: ServiceContext::new(cache, rest),
            manager,
            gateway,
        })
    }

    /// Connect with the `reqwest` transport
    pub async fn from_config(
        config: &AppConfig,
        connector: Arc<dyn ShardConnector>,
        handlers: EventHandlers,
    ) -> GatewayResult<Self> {
        let transport = ReqwestTransport::new(config.rest.timeout)?;
        Self::connect(config, Arc::new(transport), connector, handlers).await
    }

    pub fn cache(&self) -> &EntityCache {
        self.services.cache()
    }

    pub fn rest(&self) -> &RestClient {
        self.services.rest()
    }

    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    pub fn manager(&self) -> &ShardManager {
        &self.manager
    }

    pub fn gateway_info(&self) -> &GatewayBotInfo {
        &self.gateway
    }

    pub fn messages(&self) -> MessageService<'_> {
        MessageService::new(&self.services)
    }

    pub fn members(&self) -> MemberService<'_> {
        MemberService::new(&self.services)
    }

    pub fn webhooks(&self) -> WebhookService<'_> {
        WebhookService::new(&self.services)
    }

    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}
