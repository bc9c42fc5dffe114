//! Role add/remove processing for the `addrole` and `removerole` commands.

use serenity::all::{RoleId, UserId};

use crate::config::RequesterCheck;
use crate::error::AppError;
use crate::model::{
    approval::RoleAction,
    audit::Attribution,
    member::Member,
    notice::{Notice, OutgoingMessage, COLOR_GREEN, COLOR_ORANGE},
};
use crate::service::{approval::ApprovalService, gateway::DiscordGateway, welcome::WelcomeService};
use crate::state::AppState;

/// Result of a role change request. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangeOutcome {
    /// The role was added or removed.
    Applied,
    /// Add requested but the member already holds the role.
    AlreadyHasRole,
    /// Remove requested but the member does not hold the role.
    DoesNotHaveRole,
    /// An approval card was posted instead of changing the role.
    PendingApproval,
}

impl RoleChangeOutcome {
    /// Private reply shown to the requester.
    pub fn reply(&self, action: RoleAction, target: UserId, role: RoleId) -> String {
        match (self, action) {
            (RoleChangeOutcome::Applied, RoleAction::Add) => {
                format!("The <@&{}> role has been given to <@{}>.", role, target)
            }
            (RoleChangeOutcome::Applied, RoleAction::Remove) => {
                format!("The <@&{}> role has been removed from <@{}>.", role, target)
            }
            (RoleChangeOutcome::AlreadyHasRole, _) => {
                format!("<@{}> already has the role.", target)
            }
            (RoleChangeOutcome::DoesNotHaveRole, _) => {
                format!("<@{}> does not have the role.", target)
            }
            (RoleChangeOutcome::PendingApproval, RoleAction::Add) => {
                "Your request to add the role requires approval from an approver.".to_string()
            }
            (RoleChangeOutcome::PendingApproval, RoleAction::Remove) => {
                "Your request to remove the role has been sent for approval.".to_string()
            }
        }
    }
}

pub struct RoleChangeService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> RoleChangeService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    pub async fn add_role(
        &self,
        target: UserId,
        role: RoleId,
        requester: UserId,
    ) -> Result<RoleChangeOutcome, AppError> {
        self.change(RoleAction::Add, target, role, requester).await
    }

    pub async fn remove_role(
        &self,
        target: UserId,
        role: RoleId,
        requester: UserId,
    ) -> Result<RoleChangeOutcome, AppError> {
        self.change(RoleAction::Remove, target, role, requester).await
    }

    async fn change(
        &self,
        action: RoleAction,
        target: UserId,
        role: RoleId,
        requester: UserId,
    ) -> Result<RoleChangeOutcome, AppError> {
        if self.state.config.requester_check == RequesterCheck::ApproverGate {
            self.ensure_approver(action, requester).await?;
        }

        let member = self.current_member(target).await?;
        match action {
            RoleAction::Add if member.has_role(role) => {
                return Ok(RoleChangeOutcome::AlreadyHasRole)
            }
            RoleAction::Remove if !member.has_role(role) => {
                return Ok(RoleChangeOutcome::DoesNotHaveRole)
            }
            _ => {}
        }

        if self.state.config.roles.requires_approval(role) {
            let handle = ApprovalService::new(self.state, self.discord)
                .request_approval(action, &member, role, requester)
                .await?;
            tracing::debug!(
                "Approval {:?} pending on card {}",
                handle.key,
                handle.card.message_id
            );
            return Ok(RoleChangeOutcome::PendingApproval);
        }

        self.apply(action, member, role, requester).await?;
        Ok(RoleChangeOutcome::Applied)
    }

    /// Performs the mutation and its follow-up bookkeeping.
    ///
    /// The invoker is tracked before the API call so the member-update event the
    /// call triggers can be attributed to them. The cache is brought up to date
    /// only after `member_cache_update_delay`. Notifications after a successful
    /// mutation are best effort and never turn the result into an error.
    pub async fn apply(
        &self,
        action: RoleAction,
        member: Member,
        role: RoleId,
        actor: UserId,
    ) -> Result<(), AppError> {
        let target = member.id;
        self.state.role_commands.track(target, role, actor).await;

        let reason = format!("Requested by user {}", actor);
        let result = match action {
            RoleAction::Add => self.discord.add_role(target, role, &reason).await,
            RoleAction::Remove => self.discord.remove_role(target, role, &reason).await,
        };
        if let Err(e) = result {
            self.state.role_commands.remove(target, role).await;
            tracing::error!("Failed to {} role {} on {}: {}", action, role, target, e);
            return Err(e);
        }

        let community_role = self.state.config.community_member_role_id;
        let newly_community =
            action == RoleAction::Add && role == community_role && !member.has_role(role);

        // The member-update event for this change must still diff against the
        // pre-change entry, so the write waits like the diff engine's own write.
        let members = self.state.members.clone();
        self.state
            .tasks
            .schedule(self.state.config.member_cache_update_delay, async move {
                members.apply_role_change(member, action, role).await;
            });

        let notice = match action {
            RoleAction::Add => Notice::new("Role Added", COLOR_GREEN).field(
                "Added By",
                format!("<@{}>", actor),
                false,
            ),
            RoleAction::Remove => Notice::new("Role Removed", COLOR_ORANGE).field(
                "Removed By",
                format!("<@{}>", actor),
                false,
            ),
        }
        .field("Target User", format!("<@{}>", target), false)
        .field("Role", format!("<@&{}>", role), false);

        if let Err(e) = self
            .discord
            .send_message(
                self.state.config.access_control_channel_id,
                OutgoingMessage::notice(notice),
            )
            .await
        {
            tracing::warn!("Failed to post role change notice: {}", e);
        }

        if newly_community {
            if let Err(e) = WelcomeService::new(self.state, self.discord)
                .welcome(target, Attribution::Member(actor))
                .await
            {
                tracing::warn!("Failed to welcome {}: {}", target, e);
            }
        }

        tracing::info!("{} {} role {} on {}", actor, action, role, target);
        Ok(())
    }

    /// Fresh member state, falling back to the cache if the fetch fails.
    ///
    /// A member Discord reports as missing is not in the guild, so the cache is
    /// not consulted for them.
    async fn current_member(&self, target: UserId) -> Result<Member, AppError> {
        match self.discord.fetch_member(target).await {
            Ok(member) => Ok(member),
            Err(e @ AppError::NotFound(_)) => Err(e),
            Err(e) => match self.state.members.get(target).await {
                Some(cached) => {
                    tracing::warn!("Failed to fetch member {}, using cached state: {}", target, e);
                    Ok(cached)
                }
                None => Err(e),
            },
        }
    }

    async fn ensure_approver(&self, action: RoleAction, requester: UserId) -> Result<(), AppError> {
        let requester = self.discord.fetch_member(requester).await?;
        if requester.has_role(self.state.config.approver_role_id) {
            return Ok(());
        }

        Err(AppError::Unauthorized(format!(
            "You do not have permission to {} roles.",
            action
        )))
    }
}
