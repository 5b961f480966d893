//! Permission resolution
//!
//! Answers permission questions from the entity cache alone. Nothing here
//! mutates state or touches the network; anything missing from the cache
//! resolves to "not allowed" (or `None`).

use bot_cache::EntityCache;
use bot_common::AppResult;
use bot_core::{Channel, DomainError, Guild, OverwriteType, Permissions, Role, Snowflake};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Computes guild and channel permissions from cached state
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    cache: Arc<EntityCache>,
}

impl PermissionResolver {
    pub fn new(cache: Arc<EntityCache>) -> Self {
        Self { cache }
    }

    // =========================================================================
    // Guild level
    // =========================================================================

    /// Everyone role plus every held role; owners and administrators get `ALL`
    pub fn effective_guild_permissions(&self, member_id: Snowflake, guild_id: Snowflake) -> Permissions {
        self.cache
            .with_guild(guild_id, |guild| guild_permissions(guild, member_id))
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    pub fn has_guild_permissions(&self, member_id: Snowflake, guild_id: Snowflake, required: Permissions) -> bool {
        let granted = self.effective_guild_permissions(member_id, guild_id);
        let allowed = granted.contains(required);
        debug!(granted = %granted, allowed, "Guild permission check");
        allowed
    }

    pub fn bot_has_guild_permissions(&self, guild_id: Snowflake, required: Permissions) -> bool {
        self.cache
            .bot_id()
            .is_some_and(|bot_id| self.has_guild_permissions(bot_id, guild_id, required))
    }

    // =========================================================================
    // Channel level
    // =========================================================================

    /// Channel check layering member, role and everyone overwrites
    #[instrument(skip(self))]
    pub fn has_channel_permissions(&self, channel_id: Snowflake, member_id: Snowflake, required: Permissions) -> bool {
        let Some(channel) = self.cache.get_channel(channel_id) else {
            debug!("Channel not cached");
            return false;
        };
        let Some(guild_id) = channel.guild_id else {
            return true;
        };

        let bot_id = self.cache.bot_id();
        let allowed = self
            .cache
            .with_guild(guild_id, |guild| {
                channel_permitted(guild, &channel, member_id, bot_id, required)
            })
            .unwrap_or(false);

        debug!(guild_id = %guild_id, allowed, "Channel permission check");
        allowed
    }

    pub fn bot_has_channel_permissions(&self, channel_id: Snowflake, required: Permissions) -> bool {
        self.cache
            .bot_id()
            .is_some_and(|bot_id| self.has_channel_permissions(channel_id, bot_id, required))
    }

    /// Fail with `MissingPermission` unless the bot holds `required` in the channel
    pub fn require_bot_channel_permissions(&self, channel_id: Snowflake, required: Permissions) -> AppResult<()> {
        if self.bot_has_channel_permissions(channel_id, required) {
            Ok(())
        } else {
            Err(DomainError::missing(required).into())
        }
    }

    /// Fail with `MissingPermission` unless the bot holds `required` in the guild
    pub fn require_bot_guild_permissions(&self, guild_id: Snowflake, required: Permissions) -> AppResult<()> {
        if self.bot_has_guild_permissions(guild_id, required) {
            Ok(())
        } else {
            Err(DomainError::missing(required).into())
        }
    }

    // =========================================================================
    // Role hierarchy
    // =========================================================================

    /// Most senior role the member holds, else the everyone role
    pub fn highest_role(&self, guild_id: Snowflake, member_id: Snowflake) -> Option<Role> {
        self.cache
            .with_guild(guild_id, |guild| {
                let member = guild.members.get(&member_id)?;
                guild
                    .member_roles(member)
                    .max_by(|a, b| a.seniority(b))
                    .or_else(|| guild.everyone_role())
                    .cloned()
            })
            .flatten()
    }

    /// Whether `role_id` sits above `other_role_id`; equal positions go to the lower id
    pub fn higher_role_position(&self, guild_id: Snowflake, role_id: Snowflake, other_role_id: Snowflake) -> Option<bool> {
        self.cache
            .with_guild(guild_id, |guild| {
                let role = guild.roles.get(&role_id)?;
                let other = guild.roles.get(&other_role_id)?;
                Some(role.is_higher_than(other))
            })
            .flatten()
    }
}

fn guild_permissions(guild: &Guild, member_id: Snowflake) -> Permissions {
    if guild.is_owner(member_id) {
        return Permissions::ALL;
    }
    let Some(member) = guild.members.get(&member_id) else {
        return Permissions::empty();
    };

    let held = Permissions::combine(guild.member_roles(member).map(|r| r.permissions));
    (guild.everyone_permissions() | held).resolve_admin()
}

fn channel_permitted(
    guild: &Guild,
    channel: &Channel,
    member_id: Snowflake,
    bot_id: Option<Snowflake>,
    required: Permissions,
) -> bool {
    if guild.is_owner(member_id) {
        return true;
    }
    if bot_id.is_some_and(|bot| guild_permissions(guild, bot).contains(Permissions::ADMINISTRATOR)) {
        return true;
    }
    let Some(member) = guild.members.get(&member_id) else {
        return false;
    };

    let member_overwrite = channel.overwrite_for(member_id, OverwriteType::Member);
    let role_overwrites: Vec<_> = channel
        .permission_overwrites
        .iter()
        .filter(|o| o.kind == OverwriteType::Role && member.has_role(o.id))
        .collect();
    let everyone_overwrite = channel.overwrite_for(guild.id, OverwriteType::Role);

    let mut allowed = Permissions::empty();

    if let Some(overwrite) = member_overwrite {
        if overwrite.deny.intersects(required) {
            return false;
        }
        allowed |= overwrite.allow & required;
    }

    if !role_overwrites.is_empty() {
        let role_allow = Permissions::combine(role_overwrites.iter().map(|o| o.allow));
        let member_allow = member_overwrite.map(|o| o.allow).unwrap_or_default();
        let role_deny = Permissions::combine(role_overwrites.iter().map(|o| o.deny));

        // A role deny only sticks when nothing else allows the bit
        if (role_deny & required & !role_allow & !member_allow) != Permissions::empty() {
            return false;
        }
        allowed |= role_allow & required;
    }

    if let Some(overwrite) = everyone_overwrite {
        if (overwrite.deny & required & !allowed) != Permissions::empty() {
            return false;
        }
        if overwrite.allow.contains(required) {
            return true;
        }
    }

    (allowed | guild_permissions(guild, member_id)).contains(required)
}
