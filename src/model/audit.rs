//! Role-diff and actor attribution models used by the member-update audit trail.

use serenity::all::{RoleId, UserId};
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

use crate::model::role::RoleCatalog;

/// A single role-update entry from the guild audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Snowflake id of the entry, also used to derive its creation time.
    pub id: u64,
    /// Member whose roles were changed.
    pub target: Option<UserId>,
    /// User who performed the change.
    pub actor: UserId,
}

/// Who performed an observed role change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// A human member, either from the correlation cache or the audit log.
    Member(UserId),
    /// The change was authored by a bot account.
    Bot,
    /// No matching evidence within the attribution window.
    Unknown,
}

impl Attribution {
    /// The human actor, if one was identified.
    pub fn member(self) -> Option<UserId> {
        match self {
            Attribution::Member(id) => Some(id),
            _ => None,
        }
    }
}

impl Display for Attribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribution::Member(id) => write!(f, "<@{}>", id),
            Attribution::Bot => write!(f, "Bot (via slash command)"),
            Attribution::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Roles gained and lost between two observations of the same member.
///
/// Sets are ordered so notices list roles deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDiff {
    pub added: BTreeSet<RoleId>,
    pub removed: BTreeSet<RoleId>,
}

impl RoleDiff {
    /// Diffs the cached role set against the freshly observed one.
    ///
    /// Without a cached entry every new role counts as added; the previous state
    /// is unknown and treating the member as newly seen is the intended fallback.
    pub fn compute(cached: Option<&HashSet<RoleId>>, new: &HashSet<RoleId>) -> Self {
        match cached {
            None => Self {
                added: new.iter().copied().collect(),
                removed: BTreeSet::new(),
            },
            Some(cached) => Self {
                added: new.difference(cached).copied().collect(),
                removed: cached.difference(new).copied().collect(),
            },
        }
    }

    /// Drops self-service roles, which are not audited.
    pub fn without_open(mut self, catalog: &RoleCatalog) -> Self {
        self.added.retain(|role| !catalog.is_open(*role));
        self.removed.retain(|role| !catalog.is_open(*role));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Every role touched by this diff, added first.
    pub fn changed(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.added.iter().chain(self.removed.iter()).copied()
    }
}

/// Formats role ids as mentions separated by `", "`.
pub fn role_mentions<'a>(roles: impl IntoIterator<Item = &'a RoleId>) -> String {
    roles
        .into_iter()
        .map(|role| format!("<@&{}>", role))
        .collect::<Vec<_>>()
        .join(", ")
}
