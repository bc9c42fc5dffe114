//! `listrole` command: who holds a given role.

use serenity::all::{RoleId, UserId};

use crate::error::AppError;
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

const MEMBER_PAGE_SIZE: u64 = 1000;

pub struct RoleListService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> RoleListService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Lists display names of every guild member holding `role`.
    ///
    /// The full member list is paged through rather than read from the member
    /// cache, which only holds community members and may be stale.
    ///
    /// # Arguments
    /// - `requester` - User running the command; must hold the approver role
    /// - `role` - Role to list holders of
    ///
    /// # Returns
    /// - `Ok(String)` - Reply text listing the holders
    /// - `Err(AppError::Unauthorized)` - Requester is not an approver
    pub async fn list(&self, requester: UserId, role: RoleId) -> Result<String, AppError> {
        let requester = self.discord.fetch_member(requester).await?;
        if !requester.has_role(self.state.config.approver_role_id) {
            return Err(AppError::Unauthorized(
                "You do not have permission to list members with roles.".to_string(),
            ));
        }

        let mut holders = Vec::new();
        let mut after = None;
        loop {
            let page = self.discord.list_members(after, MEMBER_PAGE_SIZE).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            holders.extend(
                page.into_iter()
                    .filter(|member| member.has_role(role))
                    .map(|member| member.display_name),
            );
        }

        let role_name = self
            .state
            .config
            .roles
            .name(role)
            .map(str::to_string)
            .unwrap_or_else(|| role.to_string());

        if holders.is_empty() {
            return Ok(format!("No members have the role `@{}`.", role_name));
        }
        Ok(format!(
            "Members with the role `@{}`:\n```\n{}\n```",
            role_name,
            holders.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    /// Tests listing holders across more than one page of members.
    ///
    /// Expected: every holder listed by display name, in member order
    #[tokio::test]
    async fn lists_holders_across_pages() {
        let mut builder = TestBuilder::new().with_member(member(1, &[APPROVER_ROLE]));
        for id in 2..=1502u64 {
            let roles: &[u64] = if id % 500 == 0 { &[GATED_ROLE] } else { &[] };
            builder = builder.with_member(member(id, roles));
        }
        let test = builder.build().await;

        let reply = RoleListService::new(&test.state, test.gateway())
            .list(UserId::new(1), RoleId::new(GATED_ROLE))
            .await
            .unwrap();

        assert_eq!(
            reply,
            "Members with the role `@Officer`:\n```\nmember-500\nmember-1000\nmember-1500\n```"
        );
    }

    #[tokio::test]
    async fn rejects_non_approvers() {
        let test = TestBuilder::new().with_member(member(1, &[])).build().await;

        let result = RoleListService::new(&test.state, test.gateway())
            .list(UserId::new(1), RoleId::new(GATED_ROLE))
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn reports_empty_role() {
        let test = TestBuilder::new()
            .with_member(member(1, &[APPROVER_ROLE]))
            .build()
            .await;

        let reply = RoleListService::new(&test.state, test.gateway())
            .list(UserId::new(1), RoleId::new(PLAIN_ROLE))
            .await
            .unwrap();

        assert_eq!(reply, "No members have the role `@201`.");
    }
}
