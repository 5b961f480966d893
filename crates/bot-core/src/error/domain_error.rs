//! Domain errors - failures detected before any network call

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Message must contain content, a file or embeds")]
    EmptyMessage,

    #[error("Invalid webhook name: {0}")]
    InvalidWebhookName(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Cannot modify higher role")]
    CannotModifyHigherRole,

    #[error("Cannot kick guild owner")]
    CannotKickOwner,
}

impl DomainError {
    /// Get an error code string for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::MemberNotFound => "UNKNOWN_MEMBER",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::InvalidWebhookName(_) => "INVALID_WEBHOOK_NAME",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::CannotModifyHigherRole => "CANNOT_MODIFY_HIGHER_ROLE",
            Self::CannotKickOwner => "CANNOT_KICK_OWNER",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GuildNotFound(_) | Self::MemberNotFound)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::ContentTooLong { .. }
                | Self::EmptyMessage
                | Self::InvalidWebhookName(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::MissingPermission(_) | Self::CannotModifyHigherRole | Self::CannotKickOwner
        )
    }

    /// Missing-permission error naming every flag in the mask
    pub fn missing(permissions: crate::Permissions) -> Self {
        Self::MissingPermission(permissions.list().join(", "))
    }
}
