//! Domain model for guild members as seen by the caches and services.

use serenity::all::{GuildMemberUpdateEvent, RoleId, UserId};
use std::collections::HashSet;

/// Last-known state of a guild member.
///
/// Role ids have set semantics. Instances held by the member cache reflect the
/// role set at the time of the last observed update and may be stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Discord user id.
    pub id: UserId,
    /// Nickname, global name or username, in that order of preference.
    pub display_name: String,
    /// Role ids currently held.
    pub roles: HashSet<RoleId>,
}

impl Member {
    #[cfg(test)]
    pub fn new(
        id: UserId,
        display_name: impl Into<String>,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }

    /// Converts a Serenity member at the gateway boundary.
    pub fn from_serenity(member: &serenity::all::Member) -> Self {
        Self {
            id: member.user.id,
            display_name: member.display_name().to_string(),
            roles: member.roles.iter().copied().collect(),
        }
    }

    /// Builds the post-update member state from a raw member-update event.
    ///
    /// The event is always delivered, unlike the `new` member which is only
    /// present when Serenity's own cache holds the member.
    pub fn from_update_event(event: &GuildMemberUpdateEvent) -> Self {
        let display_name = event
            .nick
            .clone()
            .or_else(|| event.user.global_name.clone())
            .unwrap_or_else(|| event.user.name.clone());

        Self {
            id: event.user.id,
            display_name,
            roles: event.roles.iter().copied().collect(),
        }
    }
}
