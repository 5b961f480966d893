//! Member service
//!
//! Member moderation and lookups.

use bot_common::AppResult;
use bot_core::{DomainError, GuildMember, Permissions, Snowflake};
use bot_rest::{decode, endpoints};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::context::ServiceContext;

/// Member service
pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Kick a member the bot outranks
    #[instrument(skip(self))]
    pub async fn kick_member(&self, guild_id: Snowflake, member_id: Snowflake, reason: Option<&str>) -> AppResult<()> {
        let permissions = self.ctx.permissions();
        permissions.require_bot_guild_permissions(guild_id, Permissions::KICK_MEMBERS)?;

        let guild_owner = self
            .ctx
            .cache()
            .with_guild(guild_id, |g| g.owner_id)
            .ok_or(DomainError::GuildNotFound(guild_id))?;
        if guild_owner == member_id {
            return Err(DomainError::CannotKickOwner.into());
        }

        let bot_id = self.ctx.cache().bot_id().ok_or(DomainError::MemberNotFound)?;
        if let (Some(bot_role), Some(target_role)) = (
            permissions.highest_role(guild_id, bot_id),
            permissions.highest_role(guild_id, member_id),
        ) {
            if !bot_role.is_higher_than(&target_role) {
                warn!(bot_role = %bot_role.id, target_role = %target_role.id, "Kick blocked by role hierarchy");
                return Err(DomainError::CannotModifyHigherRole.into());
            }
        }

        let body = reason.map(|reason| json!({ "reason": reason }));
        self.ctx
            .rest()
            .delete(&endpoints::guild_member(guild_id, member_id), body)
            .await?;

        info!(guild_id = %guild_id, member_id = %member_id, "Member kicked");
        Ok(())
    }

    /// Fetch a member from the upstream and cache it
    #[instrument(skip(self))]
    pub async fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> AppResult<GuildMember> {
        let value = self
            .ctx
            .rest()
            .get(&endpoints::guild_member(guild_id, user_id), None)
            .await?;

        let mut member: GuildMember = decode(value)?;
        member.guild_id = guild_id;
        self.ctx.cache().upsert_member(guild_id, member.clone());
        Ok(member)
    }
}
