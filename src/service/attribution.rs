//! Resolves who performed an observed role change.

use chrono::TimeDelta;
use serenity::all::{RoleId, UserId};

use crate::model::audit::Attribution;
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

/// Number of audit-log entries scanned for a matching target.
const AUDIT_LOG_LOOKBACK: u8 = 50;

/// Audit entries older than this are not attributed to the current change.
const AUDIT_ENTRY_MAX_AGE_SECS: i64 = 30;

pub struct AttributionService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> AttributionService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Attributes a change of `roles` on `target`.
    ///
    /// The role command cache is consulted first since the audit log names the bot
    /// for command-driven changes. On a miss, the most recent audit entry targeting
    /// the member is used if it is younger than 30 seconds. Lookup failures degrade
    /// to `Unknown` rather than failing the caller.
    pub async fn resolve(
        &self,
        target: UserId,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Attribution {
        for role in roles {
            if let Some(invoker) = self.state.role_commands.lookup(target, role).await {
                tracing::debug!("Attributed change on {} to tracked invoker {}", target, invoker);
                return Attribution::Member(invoker);
            }
        }

        self.from_audit_log(target).await
    }

    async fn from_audit_log(&self, target: UserId) -> Attribution {
        let entries = match self
            .discord
            .role_update_audit_entries(AUDIT_LOG_LOOKBACK)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to fetch audit log: {}", e);
                return Attribution::Unknown;
            }
        };

        let Some(entry) = entries.into_iter().find(|entry| entry.target == Some(target)) else {
            return Attribution::Unknown;
        };

        let created = match self.state.id_clock.timestamp_of(entry.id) {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!("Failed to read audit entry timestamp: {}", e);
                return Attribution::Unknown;
            }
        };
        if self.state.id_clock.now() - created >= TimeDelta::seconds(AUDIT_ENTRY_MAX_AGE_SECS) {
            return Attribution::Unknown;
        }

        match self.discord.is_bot(entry.actor).await {
            Ok(true) => Attribution::Bot,
            Ok(false) => Attribution::Member(entry.actor),
            Err(e) => {
                tracing::debug!("Failed to look up audit actor {}: {}", entry.actor, e);
                Attribution::Member(entry.actor)
            }
        }
    }
}
