use serenity::all::{ActivityData, Context};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::AppError;
use crate::state::AppState;

/// Starts the member count presence job
///
/// Sets the bot's custom status to the number of cached community members once
/// immediately, then on every tick of `MEMBER_COUNT_SCHEDULE`.
///
/// # Arguments
/// - `state`: Shared application state holding the member cache
/// - `ctx`: Gateway context used to update the bot's presence
pub async fn start_member_count_job(state: AppState, ctx: Context) -> Result<(), AppError> {
    let scheduler = JobScheduler::new().await?;

    update_presence(&state, &ctx).await;

    let schedule = state.config.member_count_schedule.clone();
    let job_state = state.clone();
    let job_ctx = ctx.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let state = job_state.clone();
        let ctx = job_ctx.clone();

        Box::pin(async move {
            if state.tasks.is_shutting_down() {
                return;
            }
            update_presence(&state, &ctx).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!("Member count scheduler started ({})", schedule);

    Ok(())
}

async fn update_presence(state: &AppState, ctx: &Context) {
    let status = member_count_status(state).await;
    tracing::debug!("Setting presence: {}", status);
    ctx.set_activity(Some(ActivityData::custom(status)));
}

/// Status text counting cached holders of the community role.
pub async fn member_count_status(state: &AppState) -> String {
    let count = state
        .members
        .count_with_role(state.config.community_member_role_id)
        .await;
    format!("Community Members: {}", count)
}
