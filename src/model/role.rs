//! Read-only role catalog loaded from configuration.

use serenity::all::RoleId;
use std::collections::HashMap;

/// Per-role configuration flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    /// Human readable name used in menus and replies.
    pub name: String,
    /// Role changes must go through an approval card.
    pub requires_approval: bool,
    /// Self-service role, exempt from auditing and approval.
    pub open: bool,
    /// Held only with leadership sign-off; departures are flagged like gated roles.
    pub restricted: bool,
}

/// Mapping from role id to its configuration flags.
///
/// Roles missing from the catalog are neither open nor gated.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: HashMap<RoleId, RoleEntry>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_role(mut self, role_id: RoleId, name: impl Into<String>) -> Self {
        let name = name.into();
        let entry = self.entry(role_id, &name);
        entry.open = true;
        self
    }

    pub fn with_approval_role(mut self, role_id: RoleId, name: impl Into<String>) -> Self {
        let name = name.into();
        let entry = self.entry(role_id, &name);
        entry.requires_approval = true;
        self
    }

    pub fn with_restricted_role(mut self, role_id: RoleId, name: impl Into<String>) -> Self {
        let name = name.into();
        let entry = self.entry(role_id, &name);
        entry.restricted = true;
        self
    }

    fn entry(&mut self, role_id: RoleId, name: &str) -> &mut RoleEntry {
        let entry = self.roles.entry(role_id).or_insert_with(|| RoleEntry {
            name: String::new(),
            requires_approval: false,
            open: false,
            restricted: false,
        });
        if entry.name.is_empty() {
            entry.name = name.to_string();
        }
        entry
    }

    /// Open roles are never gated, even when also listed as requiring approval.
    pub fn requires_approval(&self, role_id: RoleId) -> bool {
        self.roles
            .get(&role_id)
            .is_some_and(|entry| entry.requires_approval && !entry.open)
    }

    /// Gated or restricted: a departing holder is flagged to the approvers.
    pub fn is_restricted(&self, role_id: RoleId) -> bool {
        self.requires_approval(role_id)
            || self.roles.get(&role_id).is_some_and(|entry| entry.restricted)
    }

    pub fn is_open(&self, role_id: RoleId) -> bool {
        self.roles.get(&role_id).is_some_and(|entry| entry.open)
    }

    pub fn name(&self, role_id: RoleId) -> Option<&str> {
        self.roles
            .get(&role_id)
            .map(|entry| entry.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Open roles sorted by name, then id.
    pub fn open_roles(&self) -> Vec<(RoleId, &str)> {
        let mut roles: Vec<(RoleId, &str)> = self
            .roles
            .iter()
            .filter(|(_, entry)| entry.open)
            .map(|(id, entry)| (*id, entry.name.as_str()))
            .collect();
        roles.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        roles
    }

    pub fn approval_roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = self
            .roles
            .keys()
            .copied()
            .filter(|id| self.requires_approval(*id))
            .collect();
        roles.sort();
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that an open role is never treated as approval gated.
    ///
    /// Expected: requires_approval false for a role flagged both ways
    #[test]
    fn open_wins_over_approval() {
        let catalog = RoleCatalog::new()
            .with_approval_role(RoleId::new(1), "Officer")
            .with_open_role(RoleId::new(1), "Officer")
            .with_approval_role(RoleId::new(2), "Raid Lead");

        assert!(!catalog.requires_approval(RoleId::new(1)));
        assert!(catalog.is_open(RoleId::new(1)));
        assert!(catalog.requires_approval(RoleId::new(2)));
        assert_eq!(catalog.approval_roles(), vec![RoleId::new(2)]);
        assert!(!catalog.requires_approval(RoleId::new(3)));
    }

    #[test]
    fn restricted_roles_are_not_gated() {
        let catalog = RoleCatalog::new()
            .with_approval_role(RoleId::new(1), "Officer")
            .with_restricted_role(RoleId::new(2), "Veteran");

        assert!(catalog.is_restricted(RoleId::new(1)));
        assert!(catalog.is_restricted(RoleId::new(2)));
        assert!(!catalog.requires_approval(RoleId::new(2)));
        assert!(!catalog.is_restricted(RoleId::new(3)));
    }

    #[test]
    fn open_roles_sorted_by_name() {
        let catalog = RoleCatalog::new()
            .with_open_role(RoleId::new(3), "Mythic Raid")
            .with_open_role(RoleId::new(1), "Heroic Raid")
            .with_open_role(RoleId::new(2), "Arena");

        let names: Vec<&str> = catalog.open_roles().iter().map(|(_, n)| *n).collect();
        assert_eq!(names, vec!["Arena", "Heroic Raid", "Mythic Raid"]);
    }
}
