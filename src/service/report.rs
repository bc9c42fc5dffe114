//! "Report Message" context command.

use crate::config::require;
use crate::error::AppError;
use crate::model::{
    message::MessageRef,
    notice::{Notice, OutgoingMessage, COLOR_RED},
};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

pub const REPORT_REPLY: &str = "Message has been reported.";

pub struct ReportService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> ReportService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Flags a message to the moderators.
    ///
    /// # Returns
    /// - `Ok(())` - Report posted to the moderation channel
    /// - `Err(AppError::Misconfigured)` - Moderation channel or moderator role not set
    pub async fn report(&self, message: MessageRef) -> Result<(), AppError> {
        let channel = require(
            self.state.config.moderation_channel_id,
            "MODERATION_CHANNEL_ID",
        )?;
        let moderators = require(self.state.config.moderator_role_id, "MODERATOR_ROLE_ID")?;

        let link = message.link(self.state.config.guild_id.get());
        let notice = Notice::new("Message Reported", COLOR_RED)
            .description(format!("Message Reported: {} has been reported.", link));

        self.discord
            .send_message(
                channel,
                OutgoingMessage::notice(notice).with_content(format!("<@&{}>", moderators)),
            )
            .await?;
        tracing::info!("Reported message {} in {}", message.message_id, message.channel_id);
        Ok(())
    }
}
