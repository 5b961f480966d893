//! Webhook service

use bot_common::AppResult;
use bot_core::{DomainError, Message, Permissions, Snowflake};
use bot_rest::{decode, endpoints};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreateWebhookRequest, ExecuteWebhookRequest, Webhook};

use super::context::ServiceContext;

/// Webhook service
pub struct WebhookService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WebhookService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a webhook in a channel
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_webhook(&self, channel_id: Snowflake, request: CreateWebhookRequest) -> AppResult<Webhook> {
        self.ctx
            .permissions()
            .require_bot_channel_permissions(channel_id, Permissions::MANAGE_WEBHOOKS)?;
        request
            .validate()
            .map_err(|_| DomainError::InvalidWebhookName(request.name.clone()))?;

        let value = self
            .ctx
            .rest()
            .post(&endpoints::channel_webhooks(channel_id), Some(request.to_body()))
            .await?;

        let webhook: Webhook = decode(value)?;
        info!(webhook_id = %webhook.id, channel_id = %channel_id, "Webhook created");
        Ok(webhook)
    }

    /// Execute a webhook; returns the created message when `wait` is set
    #[instrument(skip(self, token, request))]
    pub async fn execute_webhook(
        &self,
        webhook_id: Snowflake,
        token: &str,
        request: ExecuteWebhookRequest,
    ) -> AppResult<Option<Message>> {
        if request.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }
        let request = request.truncated();
        request
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let mut path = endpoints::webhook_execute(webhook_id, token);
        if request.wait {
            path.push_str("?wait=true");
        }

        let body = request.to_body();
        let rest = self.ctx.rest();
        let value = match request.file {
            Some(file) => rest.post_file(&path, Some(body), file).await?,
            None => rest.post(&path, Some(body)).await?,
        };

        if request.wait {
            decode(value).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Fetch a webhook by id
    #[instrument(skip(self))]
    pub async fn get_webhook(&self, webhook_id: Snowflake) -> AppResult<Webhook> {
        let value = self.ctx.rest().get(&endpoints::webhook(webhook_id), None).await?;
        decode(value)
    }
}
