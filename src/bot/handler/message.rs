use serenity::all::{ChannelId, Context, GuildId, Message, MessageId, MessageUpdateEvent};

use crate::model::message::ChannelMessage;
use crate::service::{embed_filter::EmbedFilter, message_log::MessageLogService};
use crate::state::AppState;

use super::{gateway, is_home_guild};

/// Handles the message event when a message is sent in a channel
pub async fn handle_message(state: &AppState, ctx: Context, message: Message) {
    if !is_home_guild(state, message.guild_id) {
        return;
    }

    let message = ChannelMessage::from_serenity(&message);
    let discord = gateway(state, &ctx);

    EmbedFilter::new(state.clone(), discord.clone()).on_message_create(&message);
    MessageLogService::new(state, discord.as_ref())
        .on_message_create(message)
        .await;
}

/// Handles the message_update event when a message is edited
pub async fn handle_message_update(
    state: &AppState,
    ctx: Context,
    _old_if_available: Option<Message>,
    new: Option<Message>,
    event: MessageUpdateEvent,
) {
    if !is_home_guild(state, event.guild_id) {
        return;
    }

    let discord = gateway(state, &ctx);
    MessageLogService::new(state, discord.as_ref())
        .on_message_update(
            event.id,
            event.content.clone(),
            new.as_ref().map(ChannelMessage::from_serenity),
        )
        .await;
}

/// Handles the message_delete event when a message is deleted
pub async fn handle_message_delete(
    state: &AppState,
    ctx: Context,
    channel_id: ChannelId,
    deleted_message_id: MessageId,
    guild_id: Option<GuildId>,
) {
    if !is_home_guild(state, guild_id) {
        return;
    }

    let discord = gateway(state, &ctx);
    if let Err(e) = MessageLogService::new(state, discord.as_ref())
        .on_message_delete(channel_id, deleted_message_id)
        .await
    {
        tracing::error!("Failed to report deleted message {}: {}", deleted_message_id, e);
    }
}
