//! Member-update diff engine.
//!
//! Every member-update event is diffed against the cached role set. Audited
//! additions and removals are posted to the audit channel, newly granted
//! community membership is welcomed, and only then is the cache brought up to
//! date. The cache write is deferred so that anything handling the same update
//! still observes the pre-update state.

use crate::error::AppError;
use crate::model::{
    audit::{role_mentions, Attribution, RoleDiff},
    member::Member,
    notice::{Notice, OutgoingMessage, COLOR_GREEN, COLOR_ORANGE},
};
use crate::service::{
    attribution::AttributionService, gateway::DiscordGateway, welcome::WelcomeService,
};
use crate::state::AppState;

pub struct MemberUpdateService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> MemberUpdateService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Processes a member update and returns the audited diff.
    ///
    /// # Arguments
    /// - `updated` - Member state carried by the update event
    ///
    /// # Returns
    /// - `RoleDiff` - Added and removed roles with open roles filtered out
    pub async fn on_member_update(&self, updated: Member) -> RoleDiff {
        let cached = self.state.members.get(updated.id).await;
        let diff = RoleDiff::compute(cached.as_ref().map(|member| &member.roles), &updated.roles);
        let audited = diff.clone().without_open(&self.state.config.roles);

        let attribution = if audited.is_empty() {
            Attribution::Unknown
        } else {
            AttributionService::new(self.state, self.discord)
                .resolve(updated.id, audited.changed())
                .await
        };

        if !audited.added.is_empty() {
            let notice = Notice::new("Role(s) Added", COLOR_GREEN)
                .field("User", format!("<@{}>", updated.id), false)
                .field("Roles Added", role_mentions(&audited.added), false)
                .field("Added By", attribution.to_string(), false);
            self.post_audit(notice).await;
        }
        if !audited.removed.is_empty() {
            let notice = Notice::new("Role(s) Removed", COLOR_ORANGE)
                .field("User", format!("<@{}>", updated.id), false)
                .field("Roles Removed", role_mentions(&audited.removed), false)
                .field("Removed By", attribution.to_string(), false);
            self.post_audit(notice).await;
        }

        if let Err(e) = self.welcome_if_new(&updated, &diff, attribution).await {
            tracing::warn!("Failed to welcome {}: {}", updated.id, e);
        }

        // Must stay last: everything above reads the pre-update cache entry.
        let members = self.state.members.clone();
        self.state
            .tasks
            .schedule(self.state.config.member_cache_update_delay, async move {
                members.put(updated).await;
            });

        audited
    }

    async fn welcome_if_new(
        &self,
        updated: &Member,
        diff: &RoleDiff,
        attribution: Attribution,
    ) -> Result<(), AppError> {
        let community_role = self.state.config.community_member_role_id;
        if !diff.added.contains(&community_role) {
            return Ok(());
        }
        // Unset general channel already reported at startup.
        if self.state.config.community_general_channel_id.is_none() {
            return Ok(());
        }

        // A tracked command already welcomed this member when it applied the role.
        if self
            .state
            .role_commands
            .lookup(updated.id, community_role)
            .await
            .is_some()
        {
            tracing::debug!("Skipping welcome for {}, granted by a role command", updated.id);
            return Ok(());
        }

        WelcomeService::new(self.state, self.discord)
            .welcome(updated.id, attribution)
            .await
    }

    async fn post_audit(&self, notice: Notice) {
        if let Err(e) = self
            .discord
            .send_message(
                self.state.config.audit_log_channel_id,
                OutgoingMessage::notice(notice),
            )
            .await
        {
            tracing::warn!("Failed to post role audit notice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::audit::AuditEntry;
    use crate::service::gateway::snowflake_at;
    use crate::testing::*;
    use chrono::{DateTime, TimeDelta};
    use serenity::all::{ChannelId, RoleId, UserId};
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn ordered(ids: &[u64]) -> BTreeSet<RoleId> {
        ids.iter().map(|id| RoleId::new(*id)).collect()
    }

    /// Tests a steady-state update with one role added and one removed.
    ///
    /// Expected: one added and one removed notice in the audit channel
    #[tokio::test(start_paused = true)]
    async fn posts_added_and_removed_notices() {
        let test = TestBuilder::new()
            .with_cached_member(member(1, &[COMMUNITY_ROLE, GATED_ROLE]))
            .build()
            .await;

        let diff = MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE, PLAIN_ROLE]))
            .await;

        assert_eq!(diff.added, ordered(&[PLAIN_ROLE]));
        assert_eq!(diff.removed, ordered(&[GATED_ROLE]));

        let sent = test.discord.sent_to(ChannelId::new(AUDIT_CHANNEL));
        assert_eq!(sent.len(), 2);
        let added = sent[0].notice.as_ref().unwrap();
        assert_eq!(added.title, "Role(s) Added");
        assert_eq!(added.field_value("Roles Added"), Some("<@&201>"));
        assert_eq!(added.field_value("Added By"), Some("Unknown"));
        assert_eq!(sent[1].notice.as_ref().unwrap().title, "Role(s) Removed");
    }

    /// Tests that the cache write happens only after the configured delay.
    ///
    /// Expected: cache holds the old roles until the delay elapses
    #[tokio::test(start_paused = true)]
    async fn cache_write_is_deferred() {
        let test = TestBuilder::new()
            .with_cached_member(member(1, &[COMMUNITY_ROLE]))
            .build()
            .await;

        MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE, PLAIN_ROLE]))
            .await;

        let before = test.state.members.get(UserId::new(1)).await.unwrap();
        assert!(!before.has_role(RoleId::new(PLAIN_ROLE)));

        tokio::time::sleep(Duration::from_millis(1001)).await;
        test.state.tasks.drain().await;

        let after = test.state.members.get(UserId::new(1)).await.unwrap();
        assert!(after.has_role(RoleId::new(PLAIN_ROLE)));
    }

    /// Tests that changes to open roles are not audited.
    ///
    /// Expected: empty diff, nothing posted
    #[tokio::test(start_paused = true)]
    async fn open_role_changes_are_silent() {
        let test = TestBuilder::new()
            .with_cached_member(member(1, &[COMMUNITY_ROLE, OPEN_ROLE]))
            .build()
            .await;

        let diff = MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE, OPEN_ROLE_2]))
            .await;

        assert!(diff.is_empty());
        assert!(test.discord.sent().is_empty());
    }

    /// Tests a cold start for a member granted the community role.
    ///
    /// Expected: every role treated as added and the member welcomed
    #[tokio::test(start_paused = true)]
    async fn cold_start_welcomes_member() {
        let test = TestBuilder::new().build().await;

        let diff = MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE, PLAIN_ROLE]))
            .await;

        assert_eq!(diff.added, ordered(&[COMMUNITY_ROLE, PLAIN_ROLE]));
        let welcome = test.discord.sent_to(ChannelId::new(GENERAL_CHANNEL));
        assert_eq!(welcome.len(), 1);
        assert!(welcome[0]
            .content
            .as_deref()
            .unwrap()
            .starts_with("<@1> has joined the community!"));
    }

    /// Tests welcome attribution from a recent audit entry.
    ///
    /// Expected: the human actor is credited in both the audit notice and the welcome
    #[tokio::test(start_paused = true)]
    async fn credits_audit_actor() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let test = TestBuilder::new()
            .with_clock(FixedClock { now })
            .with_cached_member(member(1, &[]))
            .build()
            .await;
        test.discord.push_audit_entry(AuditEntry {
            id: snowflake_at(now - TimeDelta::seconds(3)),
            target: Some(UserId::new(1)),
            actor: UserId::new(42),
        });

        MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE]))
            .await;

        let audit = test.discord.sent_to(ChannelId::new(AUDIT_CHANNEL));
        assert_eq!(
            audit[0].notice.as_ref().unwrap().field_value("Added By"),
            Some("<@42>")
        );
        let welcome = test.discord.sent_to(ChannelId::new(GENERAL_CHANNEL));
        assert!(welcome[0]
            .content
            .as_deref()
            .unwrap()
            .starts_with("<@42> has welcomed a new member!"));
    }

    /// Tests an update caused by a tracked role command.
    ///
    /// Expected: audit notice credits the invoker, welcome left to the command
    #[tokio::test(start_paused = true)]
    async fn tracked_command_skips_welcome() {
        let test = TestBuilder::new()
            .with_cached_member(member(1, &[]))
            .build()
            .await;
        test.state
            .role_commands
            .track(UserId::new(1), RoleId::new(COMMUNITY_ROLE), UserId::new(7))
            .await;

        MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE]))
            .await;

        let audit = test.discord.sent_to(ChannelId::new(AUDIT_CHANNEL));
        assert_eq!(
            audit[0].notice.as_ref().unwrap().field_value("Added By"),
            Some("<@7>")
        );
        assert!(test.discord.sent_to(ChannelId::new(GENERAL_CHANNEL)).is_empty());
    }

    /// Tests that an already-member does not get welcomed again.
    ///
    /// Expected: no message in the general channel
    #[tokio::test(start_paused = true)]
    async fn existing_member_not_welcomed() {
        let test = TestBuilder::new()
            .with_cached_member(member(1, &[COMMUNITY_ROLE]))
            .build()
            .await;

        MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE, PLAIN_ROLE]))
            .await;

        assert!(test.discord.sent_to(ChannelId::new(GENERAL_CHANNEL)).is_empty());
    }

    /// Tests a community grant with the welcome feature switched off.
    ///
    /// Expected: only the audit notice is sent
    #[tokio::test(start_paused = true)]
    async fn welcome_skipped_without_general_channel() {
        let test = TestBuilder::new()
            .with_config(|config| config.community_general_channel_id = None)
            .with_cached_member(member(1, &[]))
            .build()
            .await;

        MemberUpdateService::new(&test.state, test.gateway())
            .on_member_update(member(1, &[COMMUNITY_ROLE]))
            .await;

        let sent = test.discord.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, ChannelId::new(AUDIT_CHANNEL));
    }
}
