use serenity::all::{Client, GatewayIntents};

use crate::bot::handler::Handler;
use crate::error::AppError;
use crate::state::AppState;

/// Starts the Discord bot and runs it until shutdown
///
/// Ctrl-C shuts down every shard, which makes `client.start()` return, then
/// cancels and drains the deferred task queue before this function returns.
///
/// # Arguments
/// - `state` - Shared application state, including the bot token
///
/// # Returns
/// - `Ok(())` if the bot ran and shut down cleanly
/// - `Err(AppError)` if bot initialization or connection fails
pub async fn start_bot(state: AppState) -> Result<(), AppError> {
    // GUILD_MEMBERS and MESSAGE_CONTENT are privileged intents
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler::new(state.clone());

    let mut client = Client::builder(&state.config.discord_token, intents)
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::info!("Received Ctrl-C, shutting down");
        shard_manager.shutdown_all().await;
    });

    tracing::info!("Starting Discord bot...");

    let result = client.start().await;

    state.tasks.shutdown().await;

    result?;
    Ok(())
}
