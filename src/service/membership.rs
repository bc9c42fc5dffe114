//! Join/leave handling and member cache warm-start.

use serenity::all::{RoleId, UserId};

use crate::error::AppError;
use crate::model::{
    audit::role_mentions,
    member::Member,
    notice::{Notice, OutgoingMessage, COLOR_RED},
};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

/// Page size used when listing guild members.
const MEMBER_PAGE_SIZE: u64 = 1000;

pub struct MembershipService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> MembershipService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Caches a joining member and announces the join in the audit channel.
    pub async fn on_member_join(&self, member: Member) {
        let user_id = member.id;
        self.state.members.put(member).await;

        self.post_audit_text(format!("User <@{}> has joined the server", user_id))
            .await;
    }

    /// Announces a departure and drops the member from the cache.
    ///
    /// Departing holders of approval-gated or restricted roles are flagged to the
    /// access-control channel with a ping for each such role they held, so
    /// approvers can follow up. The flag relies on the cached role set since the member is gone.
    pub async fn on_member_leave(&self, user_id: UserId) {
        match self.state.members.get(user_id).await {
            Some(cached) => self.flag_restricted_roles(&cached).await,
            None => tracing::debug!("Member {} left but was not cached", user_id),
        }

        self.post_audit_text(format!("User <@{}> has left the server", user_id))
            .await;
        self.state.members.remove(user_id).await;
    }

    /// Warm-starts the member cache from the guild member list.
    ///
    /// Pages through the list keyed by the last seen id until an empty page comes
    /// back. Only holders of the community role are cached.
    ///
    /// # Returns
    /// - `Ok(usize)` - Number of members cached
    /// - `Err(AppError)` - Listing a page failed; members from earlier pages stay cached
    pub async fn cache_guild_members(&self) -> Result<usize, AppError> {
        let community_role = self.state.config.community_member_role_id;
        let mut after = None;
        let mut cached = 0;

        loop {
            let page = self.discord.list_members(after, MEMBER_PAGE_SIZE).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            for member in page {
                if member.has_role(community_role) {
                    self.state.members.put(member).await;
                    cached += 1;
                }
            }
        }

        tracing::info!("Cached {} community members", cached);
        Ok(cached)
    }

    async fn flag_restricted_roles(&self, member: &Member) {
        let mut restricted: Vec<RoleId> = member
            .roles
            .iter()
            .copied()
            .filter(|role| self.state.config.roles.is_restricted(*role))
            .collect();
        if restricted.is_empty() {
            return;
        }
        restricted.sort();

        let mut held: Vec<RoleId> = member.roles.iter().copied().collect();
        held.sort();
        let held: String = held.iter().map(|role| format!("\n<@&{}>", role)).collect();

        let notice = Notice::new("User Left", COLOR_RED)
            .field("User", format!("<@{}>", member.id), false)
            .field("Roles", format!("Roles removed: {}", held), false);
        let message = OutgoingMessage::notice(notice).with_content(role_mentions(&restricted));

        if let Err(e) = self
            .discord
            .send_message(self.state.config.access_control_channel_id, message)
            .await
        {
            tracing::warn!("Failed to flag departure of {}: {}", member.id, e);
        }
    }

    async fn post_audit_text(&self, text: String) {
        if let Err(e) = self
            .discord
            .send_message(
                self.state.config.audit_log_channel_id,
                OutgoingMessage::text(text),
            )
            .await
        {
            tracing::warn!("Failed to post membership notice: {}", e);
        }
    }
}
