use serenity::all::{Context, GuildId, GuildMemberUpdateEvent, Member, User};

use crate::model::member::Member as CachedMember;
use crate::service::{member_update::MemberUpdateService, membership::MembershipService};
use crate::state::AppState;

use super::{gateway, is_home_guild};

/// Handles the guild_member_addition event when a member joins a guild
pub async fn handle_guild_member_addition(state: &AppState, ctx: Context, new_member: Member) {
    if !is_home_guild(state, Some(new_member.guild_id)) {
        return;
    }

    let discord = gateway(state, &ctx);
    MembershipService::new(state, discord.as_ref())
        .on_member_join(CachedMember::from_serenity(&new_member))
        .await;
}

/// Handles the guild_member_removal event when a member leaves a guild
pub async fn handle_guild_member_removal(
    state: &AppState,
    ctx: Context,
    guild_id: GuildId,
    user: User,
    _member_data_if_available: Option<Member>,
) {
    if !is_home_guild(state, Some(guild_id)) {
        return;
    }

    let discord = gateway(state, &ctx);
    MembershipService::new(state, discord.as_ref())
        .on_member_leave(user.id)
        .await;
}

/// Handles the guild_member_update event when a member's roles or profile change
///
/// The raw event is used rather than `new`, which Serenity only fills in when
/// its own cache knows the member.
pub async fn handle_guild_member_update(
    state: &AppState,
    ctx: Context,
    _old: Option<Member>,
    _new: Option<Member>,
    event: GuildMemberUpdateEvent,
) {
    if !is_home_guild(state, Some(event.guild_id)) {
        return;
    }

    let discord = gateway(state, &ctx);
    let diff = MemberUpdateService::new(state, discord.as_ref())
        .on_member_update(CachedMember::from_update_event(&event))
        .await;

    if !diff.is_empty() {
        tracing::debug!(
            "Member {} update: {} added, {} removed",
            event.user.id,
            diff.added.len(),
            diff.removed.len()
        );
    }
}
