//! Link preview suppression in configured channels.

use std::sync::Arc;
use std::time::Duration;

use crate::model::message::{ChannelMessage, MessageRef};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

/// Discord attaches link previews asynchronously after the message is created.
const EMBED_SETTLE_DELAY: Duration = Duration::from_secs(2);

pub struct EmbedFilter {
    state: AppState,
    discord: Arc<dyn DiscordGateway>,
}

impl EmbedFilter {
    pub fn new(state: AppState, discord: Arc<dyn DiscordGateway>) -> Self {
        Self { state, discord }
    }

    /// Schedules a check of `message` for link previews.
    ///
    /// Returns true when a check was scheduled.
    pub fn on_message_create(&self, message: &ChannelMessage) -> bool {
        if message.author_is_bot
            || !self
                .state
                .config
                .embed_remove_channels
                .contains(&message.channel_id)
            || !message.content.contains("http")
        {
            return false;
        }

        let discord = self.discord.clone();
        let reference = message.reference();
        self.state.tasks.schedule(EMBED_SETTLE_DELAY, async move {
            suppress_if_embedded(discord.as_ref(), reference).await;
        });
        true
    }
}

async fn suppress_if_embedded(discord: &dyn DiscordGateway, reference: MessageRef) {
    let message = match discord.fetch_message(reference).await {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Message {} gone before embed check: {}", reference.message_id, e);
            return;
        }
    };
    if message.embeds.is_empty() {
        return;
    }

    if let Err(e) = discord.suppress_embeds(reference).await {
        tracing::warn!(
            "Failed to suppress embeds in channel {}: {}",
            reference.channel_id,
            e
        );
    }
}
