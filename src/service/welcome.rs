//! Welcome message for members newly granted the community role.

use rand::Rng;
use serenity::all::UserId;

use crate::config::require;
use crate::error::AppError;
use crate::model::{audit::Attribution, notice::OutgoingMessage};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

const GREETINGS: [&str; 14] = [
    "Hey there",
    "Hiya",
    "Hello",
    "Hi",
    "Greetings",
    "Bonjour",
    "Howdy",
    "Howdy-do",
    "Heya",
    "Salutations",
    "Oh hi",
    "Hi there",
    "Aloha",
    "Ahoy",
];

pub struct WelcomeService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> WelcomeService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Posts a greeting for `member` to the general channel.
    ///
    /// When a different human granted the role they are credited; bot or unknown
    /// attribution reads as the member joining on their own.
    ///
    /// # Returns
    /// - `Ok(())` - Greeting posted
    /// - `Err(AppError::Misconfigured)` - No general channel configured
    /// - `Err(AppError)` - Sending the message failed
    pub async fn welcome(&self, member: UserId, executor: Attribution) -> Result<(), AppError> {
        let channel = require(
            self.state.config.community_general_channel_id,
            "COMMUNITY_GENERAL_CHANNEL_ID",
        )?;

        let text = welcome_text(member, executor, random_greeting());
        self.discord
            .send_message(channel, OutgoingMessage::text(text))
            .await?;

        tracing::info!("Welcomed new community member {}", member);
        Ok(())
    }
}

fn random_greeting() -> &'static str {
    let idx = rand::rng().random_range(0..GREETINGS.len());
    GREETINGS[idx]
}

fn welcome_text(member: UserId, executor: Attribution, greeting: &str) -> String {
    match executor.member().filter(|executor| *executor != member) {
        Some(executor) => format!(
            "<@{}> has welcomed a new member!\nSay {} to <@{}>!",
            executor, greeting, member
        ),
        None => format!(
            "<@{}> has joined the community!\nSay {} to them!",
            member, greeting
        ),
    }
}
