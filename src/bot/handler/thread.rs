use serenity::all::{Context, GuildChannel};

use crate::error::AppError;
use crate::service::thread::ThreadService;
use crate::state::AppState;

use super::{gateway, is_home_guild};

/// Handles the thread_create event for forum posts and ticket threads
pub async fn handle_thread_create(state: &AppState, ctx: Context, thread: GuildChannel) {
    if !is_home_guild(state, Some(thread.guild_id)) {
        return;
    }

    let service = ThreadService::new(state.clone(), gateway(state, &ctx));
    match service.on_thread_create(thread.id, thread.parent_id).await {
        Ok(()) => {}
        Err(AppError::Misconfigured(key)) => {
            tracing::debug!("Thread {} skipped, {} is not configured", thread.id, key);
        }
        Err(e) => tracing::error!("Failed to process thread {}: {}", thread.id, e),
    }
}
