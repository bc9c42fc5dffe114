mod bot;
mod config;
mod data;
mod error;
mod model;
mod scheduler;
mod service;
mod state;

#[cfg(test)]
mod testing;

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::AppError, state::AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    config.log_disabled_features();

    let state = AppState::new(config);

    tracing::info!("Starting rolekeeper");

    bot::start::start_bot(state).await
}
