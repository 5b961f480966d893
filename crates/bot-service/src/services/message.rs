//! Message service
//!
//! Sends, edits, fetches and deletes messages on behalf of the bot.

use bot_common::{AppError, AppResult};
use bot_core::{DomainError, Message, Permissions, Snowflake};
use bot_rest::{decode, endpoints};
use serde_json::json;
use tracing::{info, instrument};
use validator::{Validate, ValidationErrors};

use crate::dto::{CreateMessageRequest, MAX_MESSAGE_LENGTH};

use super::context::ServiceContext;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a message; embeds, files and TTS need their own permission
    #[instrument(skip(self, request), fields(has_file = request.file.is_some()))]
    pub async fn send_message(&self, channel_id: Snowflake, request: CreateMessageRequest) -> AppResult<Message> {
        let mut required = Permissions::SEND_MESSAGES;
        if request.embed.is_some() {
            required |= Permissions::EMBED_LINKS;
        }
        if request.file.is_some() {
            required |= Permissions::ATTACH_FILES;
        }
        if request.tts {
            required |= Permissions::SEND_TTS_MESSAGES;
        }
        if request.reply_to.is_some() {
            required |= Permissions::READ_MESSAGE_HISTORY;
        }
        self.ctx
            .permissions()
            .require_bot_channel_permissions(channel_id, required)?;

        request.validate().map_err(content_error)?;
        if request.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }

        let path = endpoints::channel_messages(channel_id);
        let body = request.to_body(channel_id);
        let value = match request.file {
            Some(file) => self.ctx.rest().post_file(&path, Some(body), file).await?,
            None => self.ctx.rest().post(&path, Some(body)).await?,
        };

        let message: Message = decode(value)?;
        info!(message_id = %message.id, channel_id = %channel_id, "Message sent");
        Ok(message)
    }

    /// Edit one of the bot's own messages
    #[instrument(skip(self, content))]
    pub async fn edit_message(&self, channel_id: Snowflake, message_id: Snowflake, content: &str) -> AppResult<Message> {
        if let Some(cached) = self.ctx.cache().get_message(message_id) {
            if !self.ctx.cache().is_bot(cached.author.id) {
                return Err(DomainError::ValidationError(
                    "only messages sent by the bot can be edited".to_string(),
                )
                .into());
            }
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DomainError::ContentTooLong { max: MAX_MESSAGE_LENGTH }.into());
        }

        let value = self
            .ctx
            .rest()
            .patch(
                &endpoints::channel_message(channel_id, message_id),
                Some(json!({ "content": content })),
            )
            .await?;
        decode(value)
    }

    /// Delete a message; someone else's message needs MANAGE_MESSAGES
    ///
    /// A message missing from the cache is treated as someone else's.
    #[instrument(skip(self))]
    pub async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake, reason: Option<&str>) -> AppResult<()> {
        let own = self
            .ctx
            .cache()
            .get_message(message_id)
            .is_some_and(|m| self.ctx.cache().is_bot(m.author.id));
        if !own {
            self.ctx
                .permissions()
                .require_bot_channel_permissions(channel_id, Permissions::MANAGE_MESSAGES)?;
        }

        let body = reason.map(|reason| json!({ "reason": reason }));
        self.ctx
            .rest()
            .delete(&endpoints::channel_message(channel_id, message_id), body)
            .await?;

        info!(message_id = %message_id, channel_id = %channel_id, "Message deleted");
        Ok(())
    }

    /// Fetch a message from the upstream
    #[instrument(skip(self))]
    pub async fn get_message(&self, channel_id: Snowflake, message_id: Snowflake) -> AppResult<Message> {
        self.ctx.permissions().require_bot_channel_permissions(
            channel_id,
            Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY,
        )?;

        let value = self
            .ctx
            .rest()
            .get(&endpoints::channel_message(channel_id, message_id), None)
            .await?;
        decode(value)
    }
}

/// Map validator failures, reporting over-long content distinctly
fn content_error(errors: ValidationErrors) -> AppError {
    if errors.field_errors().contains_key("content") {
        DomainError::ContentTooLong { max: MAX_MESSAGE_LENGTH }.into()
    } else {
        AppError::validation(errors)
    }
}
