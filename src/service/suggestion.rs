//! `suggestion` command: forwards a member's suggestion to a leadership team.

use crate::error::AppError;
use crate::model::notice::{Notice, OutgoingMessage, COLOR_GREEN};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

pub struct SuggestionService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> SuggestionService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Posts `suggestion` to the channel of the team named `team`.
    ///
    /// # Arguments
    /// - `author` - Username shown in the notice footer
    /// - `team` - Team name as configured in `LEADERSHIP_CHANNELS`
    /// - `suggestion` - Free text submitted by the member
    ///
    /// # Returns
    /// - `Ok(String)` - Private confirmation for the author
    /// - `Err(AppError::Misconfigured)` - No leadership channels configured
    /// - `Err(AppError::BadRequest)` - `team` matches no configured channel
    pub async fn submit(
        &self,
        author: &str,
        team: &str,
        suggestion: &str,
    ) -> Result<String, AppError> {
        let channels = &self.state.config.leadership_channels;
        if channels.is_empty() {
            return Err(AppError::Misconfigured("LEADERSHIP_CHANNELS".to_string()));
        }

        let target = channels
            .iter()
            .find(|channel| channel.name == team)
            .ok_or_else(|| {
                AppError::BadRequest("Channel not found. Please check the channel name.".to_string())
            })?;

        let notice = Notice::new("New Suggestion", COLOR_GREEN)
            .description(suggestion)
            .footer(format!("Suggested by {}", author));
        self.discord
            .send_message(target.channel_id, OutgoingMessage::notice(notice))
            .await?;

        tracing::info!("Suggestion from {} sent to {}", author, target.name);
        Ok(format!(
            "Your suggestion has been sent to the {} team.",
            target.name
        ))
    }
}
