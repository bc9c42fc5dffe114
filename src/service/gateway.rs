//! Outbound collaborator seam.
//!
//! Services talk to Discord only through `DiscordGateway`, scoped to the single
//! configured guild. The Serenity-backed implementation lives in
//! `bot::gateway`; tests use the in-memory fake from `testing`.

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, RoleId, UserId};
use serenity::async_trait;

use crate::error::{internal::InternalError, AppError};
use crate::model::{
    audit::AuditEntry,
    member::Member,
    message::{ChannelMessage, MessageRef},
    notice::OutgoingMessage,
};

/// Discord operations used by the services, scoped to the configured guild.
#[async_trait]
pub trait DiscordGateway: Send + Sync {
    /// Fetches a guild member fresh from the API.
    async fn fetch_member(&self, user_id: UserId) -> Result<Member, AppError>;

    /// Lists up to `limit` members with ids greater than `after`.
    async fn list_members(
        &self,
        after: Option<UserId>,
        limit: u64,
    ) -> Result<Vec<Member>, AppError>;

    async fn add_role(&self, user_id: UserId, role_id: RoleId, reason: &str)
        -> Result<(), AppError>;

    async fn remove_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), AppError>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageRef, AppError>;

    /// Edits a message. Content and notice are replaced only when present;
    /// components are always replaced, so an empty list strips them.
    async fn edit_message(&self, message: MessageRef, edit: OutgoingMessage)
        -> Result<(), AppError>;

    async fn pin_message(&self, message: MessageRef) -> Result<(), AppError>;

    /// Most recent messages in a channel, newest first.
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, AppError>;

    async fn fetch_message(&self, message: MessageRef) -> Result<ChannelMessage, AppError>;

    async fn suppress_embeds(&self, message: MessageRef) -> Result<(), AppError>;

    /// Most recent member role-update entries from the guild audit log, newest first.
    async fn role_update_audit_entries(&self, limit: u8) -> Result<Vec<AuditEntry>, AppError>;

    async fn is_bot(&self, user_id: UserId) -> Result<bool, AppError>;
}

/// Approximate creation time of an opaque id.
pub trait IdClock: Send + Sync {
    fn timestamp_of(&self, id: u64) -> Result<DateTime<Utc>, InternalError>;

    fn now(&self) -> DateTime<Utc>;
}

/// Milliseconds between the Unix epoch and the first second of 2015.
pub const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Reads the timestamp embedded in the upper 42 bits of a Discord snowflake.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeClock;

impl IdClock for SnowflakeClock {
    fn timestamp_of(&self, id: u64) -> Result<DateTime<Utc>, InternalError> {
        let millis = (id >> 22) + DISCORD_EPOCH_MS;
        let millis = i64::try_from(millis).map_err(|e| InternalError::InvalidDiscordTimestamp {
            timestamp: i64::MAX,
            reason: e.to_string(),
        })?;

        DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            InternalError::InvalidDiscordTimestamp {
                timestamp: millis,
                reason: "timestamp out of range".to_string(),
            }
        })
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds a snowflake whose timestamp component is `at`.
#[cfg(test)]
pub fn snowflake_at(at: DateTime<Utc>) -> u64 {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    millis.saturating_sub(DISCORD_EPOCH_MS) << 22
}
