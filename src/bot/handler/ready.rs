use serenity::all::{Context, Ready};

use crate::bot::command::register_commands;
use crate::scheduler::member_count::start_member_count_job;
use crate::service::{membership::MembershipService, role_select::RoleSelectService};
use crate::state::AppState;

use super::gateway;

/// Handles the ready event
///
/// Ready fires again after every reconnect; the one-time setup (command
/// registration, cache warm-start, role menu and presence job) only runs on the
/// first one.
pub async fn handle_ready(state: &AppState, ctx: Context, ready: Ready) {
    tracing::info!("{} is connected to Discord!", ready.user.name);

    if !state.mark_started() {
        tracing::debug!("Reconnected, skipping startup tasks");
        return;
    }

    if let Err(e) = register_commands(&ctx, &state.config).await {
        tracing::error!("Failed to register commands: {}", e);
    }

    let discord = gateway(state, &ctx);

    match MembershipService::new(state, discord.as_ref())
        .cache_guild_members()
        .await
    {
        Ok(count) => tracing::info!("Member cache warm-started with {} members", count),
        Err(e) => tracing::error!("Failed to warm-start member cache: {}", e),
    }

    if let Err(e) = RoleSelectService::new(state, discord.as_ref()).post_menu().await {
        tracing::warn!("Role selection menu not posted: {}", e);
    }

    if let Err(e) = start_member_count_job(state.clone(), ctx.clone()).await {
        tracing::error!("Failed to start member count scheduler: {}", e);
    }
}
