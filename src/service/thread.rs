//! One-time processing of new forum and ticket threads.

use serenity::all::{ChannelId, UserId};
use std::sync::Arc;
use std::time::Duration;

use crate::config::require;
use crate::error::AppError;
use crate::model::{
    message::ChannelMessage,
    notice::{Notice, OutgoingMessage, COLOR_BLUE},
};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

/// Wait before each look at a new ticket thread. Ticket content is posted by
/// another bot and may take several seconds to appear.
const TICKET_POLL_DELAYS: [Duration; 5] = [
    Duration::from_secs(2),
    Duration::from_secs(4),
    Duration::from_secs(6),
    Duration::from_secs(8),
    Duration::from_secs(10),
];

const TICKET_MESSAGE_LOOKBACK: u8 = 100;

/// Character details extracted from a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TicketInfo {
    user: UserId,
    character: String,
    realm: String,
}

pub struct ThreadService {
    state: AppState,
    discord: Arc<dyn DiscordGateway>,
}

impl ThreadService {
    pub fn new(state: AppState, discord: Arc<dyn DiscordGateway>) -> Self {
        Self { state, discord }
    }

    /// Routes a newly created thread by its parent channel.
    pub async fn on_thread_create(
        &self,
        thread: ChannelId,
        parent: Option<ChannelId>,
    ) -> Result<(), AppError> {
        let Some(parent) = parent else {
            return Ok(());
        };

        if Some(parent) == self.state.config.djs_app_forum_channel_id {
            self.process_application(thread).await
        } else if Some(parent) == self.state.config.ticket_channel_id {
            self.start_ticket(thread).await;
            Ok(())
        } else {
            Ok(())
        }
    }

    /// Pins the application post and pings the reviewing role.
    async fn process_application(&self, thread: ChannelId) -> Result<(), AppError> {
        let role = require(self.state.config.djs_member_role_id, "DJS_MEMBER_ROLE_ID")?;
        if !self.state.threads.claim(thread).await {
            tracing::debug!("Application thread {} already processed", thread);
            return Ok(());
        }

        match self.discord.fetch_messages(thread, 1).await {
            Ok(messages) => {
                if let Some(starter) = messages.first() {
                    if let Err(e) = self.discord.pin_message(starter.reference()).await {
                        tracing::warn!("Failed to pin application in {}: {}", thread, e);
                    }
                }
            }
            Err(e) => tracing::warn!("Failed to fetch application in {}: {}", thread, e),
        }

        self.discord
            .send_message(thread, OutgoingMessage::text(format!("<@&{}>", role)))
            .await?;
        tracing::info!("Processed application thread {}", thread);
        Ok(())
    }

    async fn start_ticket(&self, thread: ChannelId) {
        if !self.state.threads.claim(thread).await {
            tracing::debug!("Ticket thread {} already processed", thread);
            return;
        }

        let discord = self.discord.clone();
        self.state.tasks.spawn(async move {
            poll_ticket(discord.as_ref(), thread).await;
        });
    }
}

/// Looks for ticket details a fixed number of times, then gives up.
async fn poll_ticket(discord: &dyn DiscordGateway, thread: ChannelId) {
    for (attempt, delay) in TICKET_POLL_DELAYS.iter().enumerate() {
        tokio::time::sleep(*delay).await;

        let messages = match discord.fetch_messages(thread, TICKET_MESSAGE_LOOKBACK).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Failed to fetch ticket {} messages: {}", thread, e);
                continue;
            }
        };

        if let Some(info) = ticket_info(&messages) {
            let notice = Notice::new("Copy & Paste for Inviters", COLOR_BLUE)
                .field("Character", format!("{} - {}", info.character, info.realm), false)
                .field("Guild Note", format!("[XFa:{}]", info.character), false)
                .field("Officer Note", format!("`<@{}>`", info.user), false);

            if let Err(e) = discord
                .send_message(thread, OutgoingMessage::notice(notice))
                .await
            {
                tracing::error!("Failed to post inviter details to {}: {}", thread, e);
            }
            return;
        }

        tracing::debug!("Ticket {} incomplete after attempt {}", thread, attempt + 1);
    }

    tracing::warn!(
        "Gave up on ticket {} after {} attempts",
        thread,
        TICKET_POLL_DELAYS.len()
    );
}

/// Mentioned user plus character name and realm from the second embed of the ticket form.
fn ticket_info(messages: &[ChannelMessage]) -> Option<TicketInfo> {
    let user = messages
        .iter()
        .find_map(|message| message.mentions.first().copied())?;
    let form = messages
        .iter()
        .find(|message| message.embeds.len() >= 2)?
        .embeds
        .get(1)?;

    let character = form.field("Character Name")?.trim();
    let realm = form.field("Realm or Server")?.trim();
    if character.is_empty() || realm.is_empty() {
        return None;
    }

    Some(TicketInfo {
        user,
        character: character.to_string(),
        realm: realm.to_string(),
    })
}
