//! Message cache upkeep and deleted-message reporting.

use serenity::all::{ChannelId, MessageId};

use crate::error::AppError;
use crate::model::{
    message::ChannelMessage,
    notice::{Notice, OutgoingMessage},
};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

const NOT_CACHED: &str = "Message was not cached, unable to retrieve message content";

pub struct MessageLogService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> MessageLogService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    pub async fn on_message_create(&self, message: ChannelMessage) {
        self.state.messages.put(message).await;
    }

    /// Refreshes a cached message after an edit.
    ///
    /// Update events may carry only the changed fields. A cached message gets its
    /// content replaced; otherwise the full message is cached if the event had one.
    pub async fn on_message_update(
        &self,
        message_id: MessageId,
        content: Option<String>,
        full: Option<ChannelMessage>,
    ) {
        if let Some(content) = content {
            if self.state.messages.update_content(message_id, content).await {
                return;
            }
        }
        if let Some(message) = full {
            self.state.messages.put(message).await;
        }
    }

    /// Posts a "Message Deleted" notice to the audit channel.
    pub async fn on_message_delete(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), AppError> {
        let (author, content) = match self.state.messages.remove(message_id).await {
            Some(message) if message.content.is_empty() => {
                (format!("<@{}>", message.author), "*(no text content)*".to_string())
            }
            Some(message) => (format!("<@{}>", message.author), message.content),
            None => ("Unknown".to_string(), NOT_CACHED.to_string()),
        };

        let notice = Notice::new("Message Deleted", 0)
            .field("Channel", format!("<#{}>", channel_id), false)
            .field("Author", author, false)
            .field("Message", content, false);

        self.discord
            .send_message(
                self.state.config.audit_log_channel_id,
                OutgoingMessage::notice(notice),
            )
            .await?;
        Ok(())
    }
}
