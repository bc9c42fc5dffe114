//! Approval workflow for gated role changes.
//!
//! A request is posted as a card to the access-control channel carrying approve
//! and deny buttons. The button ids encode the whole request, so resolution only
//! needs the ledger to refuse a second decision on the same card.

use serenity::all::{RoleId, UserId};

use crate::error::AppError;
use crate::model::{
    approval::{ApprovalKey, ApprovalState, CorrelationId, Decision, RoleAction},
    member::Member,
    message::MessageRef,
    notice::{
        Button, ButtonKind, Component, Notice, OutgoingMessage, COLOR_GREEN, COLOR_RED,
    },
};
use crate::service::{gateway::DiscordGateway, role_change::RoleChangeService};
use crate::state::AppState;

/// A posted approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalHandle {
    pub key: ApprovalKey,
    pub card: MessageRef,
}

/// Result of acting on an approval card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Approved,
    Denied,
    /// The card was already resolved; nothing changed.
    AlreadyResolved(ApprovalState),
}

impl ResolveOutcome {
    /// Private reply shown to the approver.
    pub fn reply(&self) -> &'static str {
        match self {
            ResolveOutcome::Approved => "Request approved.",
            ResolveOutcome::Denied => "Request denied.",
            ResolveOutcome::AlreadyResolved(_) => "This request has already been resolved.",
        }
    }
}

pub struct ApprovalService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> ApprovalService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Posts an approval card for changing `role` on `target`.
    ///
    /// # Arguments
    /// - `action` - Whether the role is to be added or removed
    /// - `target` - Member whose roles would change
    /// - `role` - Role requiring approval
    /// - `requester` - User who asked for the change
    ///
    /// # Returns
    /// - `Ok(ApprovalHandle)` - Card posted and request pending
    /// - `Err(AppError::BadRequest)` - Role does not require approval
    /// - `Err(AppError)` - Card could not be posted; no request is left pending
    pub async fn request_approval(
        &self,
        action: RoleAction,
        target: &Member,
        role: RoleId,
        requester: UserId,
    ) -> Result<ApprovalHandle, AppError> {
        if !self.state.config.roles.requires_approval(role) {
            return Err(AppError::BadRequest(
                "This role does not require approval.".to_string(),
            ));
        }

        let key = ApprovalKey::new(action, target.id, role);
        self.state.approvals.open(key).await;

        let card = self.pending_card(key, requester);
        match self
            .discord
            .send_message(self.state.config.access_control_channel_id, card)
            .await
        {
            Ok(card) => {
                tracing::info!(
                    "Approval requested by {} to {} role {} on {}",
                    requester,
                    action,
                    role,
                    target.id
                );
                Ok(ApprovalHandle { key, card })
            }
            Err(e) => {
                self.state.approvals.forget(key).await;
                Err(e)
            }
        }
    }

    /// Applies an approver's decision to a pending card.
    ///
    /// The actor must hold the approver role. The terminal state is claimed before
    /// any mutation runs so a concurrent or repeated click resolves to
    /// `AlreadyResolved`. If the approved mutation fails the request goes back to
    /// pending and the error is returned for the actor to see.
    pub async fn resolve(
        &self,
        id: CorrelationId,
        actor: UserId,
        card: MessageRef,
    ) -> Result<ResolveOutcome, AppError> {
        let approver = self.discord.fetch_member(actor).await?;
        if !approver.has_role(self.state.config.approver_role_id) {
            return Err(AppError::Unauthorized(
                "You do not have permission to approve this request.".to_string(),
            ));
        }

        let key = id.key;
        if let Err(state) = self
            .state
            .approvals
            .transition(key, id.decision.terminal_state())
            .await
        {
            tracing::debug!("Ignoring {} on already resolved request {:?}", id.decision, key);
            return Ok(ResolveOutcome::AlreadyResolved(state));
        }

        if id.decision == Decision::Approve {
            if let Err(e) = self.apply(key, actor).await {
                self.state.approvals.reopen(key).await;
                tracing::error!("Approved role change {:?} failed: {}", key, e);
                return Err(e);
            }
        }

        let resolved = self.resolved_card(key, id.decision, actor);
        if let Err(e) = self.discord.edit_message(card, resolved).await {
            tracing::warn!("Failed to update approval card: {}", e);
        }

        tracing::info!("{} resolved request {:?} with {}", actor, key, id.decision);
        Ok(match id.decision {
            Decision::Approve => ResolveOutcome::Approved,
            Decision::Deny => ResolveOutcome::Denied,
        })
    }

    async fn apply(&self, key: ApprovalKey, actor: UserId) -> Result<(), AppError> {
        let target = self.discord.fetch_member(key.target).await?;
        RoleChangeService::new(self.state, self.discord)
            .apply(key.action, target, key.role, actor)
            .await
    }

    fn pending_card(&self, key: ApprovalKey, requester: UserId) -> OutgoingMessage {
        let approver_role = self.state.config.approver_role_id;
        let (title, description, color) = match key.action {
            RoleAction::Add => (
                "Role Request",
                format!(
                    "<@{}> has requested to add the <@&{}> role to <@{}>",
                    requester, key.role, key.target
                ),
                COLOR_GREEN,
            ),
            RoleAction::Remove => (
                "Role Removal Request",
                format!(
                    "<@{}> has requested to remove the <@&{}> role from <@{}>",
                    requester, key.role, key.target
                ),
                COLOR_RED,
            ),
        };

        let notice = Notice::new(title, color)
            .description(description)
            .field("Approval Role", format!("<@&{}>", approver_role), true);

        OutgoingMessage::notice(notice)
            .with_content(format!("||<@&{}>||", approver_role))
            .with_components(vec![Component::Buttons(vec![
                Button::new(
                    key.correlation_id(Decision::Approve).to_string(),
                    "Approve",
                    ButtonKind::Primary,
                ),
                Button::new(
                    key.correlation_id(Decision::Deny).to_string(),
                    "Deny",
                    ButtonKind::Danger,
                ),
            ])])
    }

    fn resolved_card(&self, key: ApprovalKey, decision: Decision, actor: UserId) -> OutgoingMessage {
        let change = match key.action {
            RoleAction::Add => format!("Add <@&{}> to <@{}>", key.role, key.target),
            RoleAction::Remove => format!("Remove <@&{}> from <@{}>", key.role, key.target),
        };
        let (title, field, color) = match decision {
            Decision::Approve => ("Request Approved", "Approved By", COLOR_GREEN),
            Decision::Deny => ("Request Denied", "Denied By", COLOR_RED),
        };

        let notice = Notice::new(title, color)
            .description(change)
            .field(field, format!("<@{}>", actor), true)
            .timestamp(self.state.id_clock.now());

        // No components: the buttons are stripped from the resolved card.
        OutgoingMessage::notice(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use serenity::all::ChannelId;

    const TARGET: u64 = 10;
    const REQUESTER: u64 = 11;
    const APPROVER: u64 = 12;
    const OUTSIDER: u64 = 13;

    async fn setup() -> TestContext {
        TestBuilder::new()
            .with_member(member(TARGET, &[COMMUNITY_ROLE]))
            .with_member(member(REQUESTER, &[COMMUNITY_ROLE]))
            .with_member(member(APPROVER, &[COMMUNITY_ROLE, APPROVER_ROLE]))
            .with_member(member(OUTSIDER, &[COMMUNITY_ROLE]))
            .build()
            .await
    }

    async fn request(test: &TestContext, action: RoleAction) -> ApprovalHandle {
        let target = test.discord.member(UserId::new(TARGET)).unwrap();
        ApprovalService::new(&test.state, test.gateway())
            .request_approval(action, &target, RoleId::new(GATED_ROLE), UserId::new(REQUESTER))
            .await
            .unwrap()
    }

    /// Tests posting an approval card.
    ///
    /// Expected: card in the access-control channel with approve/deny ids encoding the request
    #[tokio::test]
    async fn posts_card_with_correlation_ids() {
        let test = setup().await;

        let handle = request(&test, RoleAction::Add).await;

        let sent = test.discord.sent_to(ChannelId::new(ACCESS_CHANNEL));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content.as_deref(), Some("||<@&100>||"));
        assert_eq!(sent[0].notice.as_ref().unwrap().title, "Role Request");

        let Component::Buttons(buttons) = &sent[0].components[0] else {
            panic!("expected buttons");
        };
        assert_eq!(buttons[0].custom_id, "approve_add_role_10_200");
        assert_eq!(buttons[1].custom_id, "deny_add_role_10_200");
        assert_eq!(test.state.approvals.state(handle.key).await, ApprovalState::Pending);
        assert!(test.discord.role_calls().is_empty());
    }

    /// Tests requesting approval for a role that is not gated.
    ///
    /// Expected: BadRequest, nothing posted
    #[tokio::test]
    async fn rejects_ungated_role() {
        let test = setup().await;
        let target = test.discord.member(UserId::new(TARGET)).unwrap();

        let result = ApprovalService::new(&test.state, test.gateway())
            .request_approval(
                RoleAction::Add,
                &target,
                RoleId::new(PLAIN_ROLE),
                UserId::new(REQUESTER),
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(test.discord.sent().is_empty());
    }

    /// Tests the full approval path including an unauthorized click.
    ///
    /// Expected: outsider rejected with no change; approver applies the role,
    /// updates the cache and strips the buttons
    #[tokio::test(start_paused = true)]
    async fn unauthorized_then_approved() {
        let test = setup().await;
        let handle = request(&test, RoleAction::Add).await;
        let id = handle.key.correlation_id(Decision::Approve);
        let service = ApprovalService::new(&test.state, test.gateway());

        let denied = service.resolve(id, UserId::new(OUTSIDER), handle.card).await;
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));
        assert!(test.discord.role_calls().is_empty());
        assert_eq!(test.state.approvals.state(handle.key).await, ApprovalState::Pending);

        let outcome = service
            .resolve(id, UserId::new(APPROVER), handle.card)
            .await
            .unwrap();

        assert_eq!(outcome, ResolveOutcome::Approved);
        assert_eq!(
            test.discord.role_calls(),
            vec![(RoleAction::Add, UserId::new(TARGET), RoleId::new(GATED_ROLE))]
        );
        test.state.tasks.drain().await;
        let cached = test.state.members.get(UserId::new(TARGET)).await.unwrap();
        assert!(cached.has_role(RoleId::new(GATED_ROLE)));

        let edits = test.discord.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, handle.card);
        assert!(edits[0].1.components.is_empty());
        let notice = edits[0].1.notice.as_ref().unwrap();
        assert_eq!(notice.title, "Request Approved");
        assert_eq!(notice.field_value("Approved By"), Some("<@12>"));
        assert!(notice.timestamp.is_some());
    }

    /// Tests a second decision on an already resolved card.
    ///
    /// Expected: AlreadyResolved(Approved), no second mutation or edit
    #[tokio::test(start_paused = true)]
    async fn second_decision_is_a_no_op() {
        let test = setup().await;
        let handle = request(&test, RoleAction::Add).await;
        let service = ApprovalService::new(&test.state, test.gateway());

        service
            .resolve(
                handle.key.correlation_id(Decision::Approve),
                UserId::new(APPROVER),
                handle.card,
            )
            .await
            .unwrap();
        let second = service
            .resolve(
                handle.key.correlation_id(Decision::Deny),
                UserId::new(APPROVER),
                handle.card,
            )
            .await
            .unwrap();

        assert_eq!(second, ResolveOutcome::AlreadyResolved(ApprovalState::Approved));
        assert_eq!(test.discord.role_calls().len(), 1);
        assert_eq!(test.discord.edits().len(), 1);
    }

    /// Tests denying a request.
    ///
    /// Expected: Denied, card edited, no mutation
    #[tokio::test]
    async fn deny_does_not_mutate() {
        let test = setup().await;
        let handle = request(&test, RoleAction::Remove).await;

        let outcome = ApprovalService::new(&test.state, test.gateway())
            .resolve(
                handle.key.correlation_id(Decision::Deny),
                UserId::new(APPROVER),
                handle.card,
            )
            .await
            .unwrap();

        assert_eq!(outcome, ResolveOutcome::Denied);
        assert!(test.discord.role_calls().is_empty());
        assert_eq!(
            test.discord.edits()[0].1.notice.as_ref().unwrap().title,
            "Request Denied"
        );
    }

    /// Tests a failing mutation after approval.
    ///
    /// Expected: error surfaced, request back to pending, card untouched
    #[tokio::test(start_paused = true)]
    async fn failed_mutation_reopens_request() {
        let test = setup().await;
        let handle = request(&test, RoleAction::Add).await;
        test.discord.set_fail_mutations(true);

        let result = ApprovalService::new(&test.state, test.gateway())
            .resolve(
                handle.key.correlation_id(Decision::Approve),
                UserId::new(APPROVER),
                handle.card,
            )
            .await;

        assert!(result.unwrap_err().is_collaborator_failure());
        assert_eq!(test.state.approvals.state(handle.key).await, ApprovalState::Pending);
        assert!(test.discord.edits().is_empty());
    }
}
