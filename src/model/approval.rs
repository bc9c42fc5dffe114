//! Domain models for role-change approval requests.
//!
//! A pending request is identified by `(action, target, role)`. That identity is
//! encoded into the custom id of the approve/deny buttons on the approval card,
//! so resolving a request never depends on state that would be lost on restart.

use serenity::all::{RoleId, UserId};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::internal::InternalError;
use crate::model::parse_snowflake;

/// Direction of a role mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleAction {
    Add,
    Remove,
}

impl Display for RoleAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RoleAction::Add => "add",
                RoleAction::Remove => "remove",
            }
        )
    }
}

/// Choice made by an approver on a pending card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// The terminal state this decision moves a request into.
    pub fn terminal_state(self) -> ApprovalState {
        match self {
            Decision::Approve => ApprovalState::Approved,
            Decision::Deny => ApprovalState::Denied,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Decision::Approve => "approve",
                Decision::Deny => "deny",
            }
        )
    }
}

/// Lifecycle of an approval request. `Approved` and `Denied` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Approved,
    Denied,
}

impl ApprovalState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalState::Pending)
    }
}

/// Identity of a pending approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApprovalKey {
    pub action: RoleAction,
    pub target: UserId,
    pub role: RoleId,
}

impl ApprovalKey {
    pub fn new(action: RoleAction, target: UserId, role: RoleId) -> Self {
        Self {
            action,
            target,
            role,
        }
    }

    /// Custom id for the button carrying `decision` on this request's card.
    pub fn correlation_id(self, decision: Decision) -> CorrelationId {
        CorrelationId { decision, key: self }
    }
}

/// Custom id attached to an approve/deny button.
///
/// Rendered as `{decision}_{action}_role_{target}_{role}`, e.g.
/// `approve_add_role_1234_5678`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId {
    pub decision: Decision,
    pub key: ApprovalKey,
}

impl CorrelationId {
    /// Cheap prefix check used to route component interactions.
    pub fn matches(custom_id: &str) -> bool {
        (custom_id.starts_with("approve_") || custom_id.starts_with("deny_"))
            && custom_id.contains("_role_")
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_role_{}_{}",
            self.decision, self.key.action, self.key.target, self.key.role
        )
    }
}

impl FromStr for CorrelationId {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| InternalError::ParseCustomId {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('_').collect();
        let [decision, action, marker, target, role] = parts.as_slice() else {
            return Err(fail("expected 5 segments"));
        };

        let decision = match *decision {
            "approve" => Decision::Approve,
            "deny" => Decision::Deny,
            _ => return Err(fail("unknown decision")),
        };
        let action = match *action {
            "add" => RoleAction::Add,
            "remove" => RoleAction::Remove,
            _ => return Err(fail("unknown action")),
        };
        if *marker != "role" {
            return Err(fail("missing role marker"));
        }
        let target = parse_snowflake(target).ok_or_else(|| fail("invalid target id"))?;
        let role = parse_snowflake(role).ok_or_else(|| fail("invalid role id"))?;

        Ok(CorrelationId {
            decision,
            key: ApprovalKey::new(action, UserId::new(target), RoleId::new(role)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that a card's button ids can be parsed back into the request.
    ///
    /// Expected: parsing the rendered id yields the same decision and key
    #[test]
    fn parses_rendered_id() {
        let key = ApprovalKey::new(RoleAction::Remove, UserId::new(1234), RoleId::new(5678));
        let rendered = key.correlation_id(Decision::Deny).to_string();

        assert_eq!(rendered, "deny_remove_role_1234_5678");
        assert!(CorrelationId::matches(&rendered));

        let parsed: CorrelationId = rendered.parse().unwrap();
        assert_eq!(parsed.decision, Decision::Deny);
        assert_eq!(parsed.key, key);
    }

    /// Tests rejecting ids that look similar but are malformed.
    ///
    /// Expected: Err for unknown action, zero id and missing segments
    #[test]
    fn rejects_malformed_ids() {
        assert!("approve_grant_role_1_2".parse::<CorrelationId>().is_err());
        assert!("approve_add_role_0_2".parse::<CorrelationId>().is_err());
        assert!("approve_add_role_1".parse::<CorrelationId>().is_err());
        assert!(!CorrelationId::matches("role_select:0"));
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!ApprovalState::Pending.is_terminal());
        assert!(Decision::Approve.terminal_state().is_terminal());
        assert_eq!(Decision::Deny.terminal_state(), ApprovalState::Denied);
    }
}
