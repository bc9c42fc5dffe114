use serenity::all::{
    ChannelId, Context, EventHandler, GuildChannel, GuildId, GuildMemberUpdateEvent, Interaction,
    Member, Message, MessageId, MessageUpdateEvent, Ready, User,
};
use serenity::async_trait;
use std::sync::Arc;

use crate::bot::gateway::SerenityGateway;
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

pub mod interaction;
pub mod member;
pub mod message;
pub mod ready;
pub mod thread;

/// Discord bot event handler
pub struct Handler {
    pub state: AppState,
}

impl Handler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

/// Gateway for the configured guild over the context's HTTP client.
fn gateway(state: &AppState, ctx: &Context) -> Arc<dyn DiscordGateway> {
    Arc::new(SerenityGateway::new(ctx.http.clone(), state.config.guild_id))
}

/// Events from guilds other than the configured one are ignored.
fn is_home_guild(state: &AppState, guild_id: Option<GuildId>) -> bool {
    guild_id == Some(state.config.guild_id)
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        ready::handle_ready(&self.state, ctx, ready).await;
    }

    /// Called when a member joins a guild
    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        member::handle_guild_member_addition(&self.state, ctx, new_member).await;
    }

    /// Called when a member leaves a guild
    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        member_data_if_available: Option<Member>,
    ) {
        member::handle_guild_member_removal(
            &self.state,
            ctx,
            guild_id,
            user,
            member_data_if_available,
        )
        .await;
    }

    /// Called when a member is updated in a guild (roles, nickname, etc.)
    async fn guild_member_update(
        &self,
        ctx: Context,
        old: Option<Member>,
        new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        member::handle_guild_member_update(&self.state, ctx, old, new, event).await;
    }

    /// Called when a message is sent in a channel
    async fn message(&self, ctx: Context, message: Message) {
        message::handle_message(&self.state, ctx, message).await;
    }

    /// Called when a message is edited
    async fn message_update(
        &self,
        ctx: Context,
        old_if_available: Option<Message>,
        new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        message::handle_message_update(&self.state, ctx, old_if_available, new, event).await;
    }

    /// Called when a message is deleted
    async fn message_delete(
        &self,
        ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        message::handle_message_delete(&self.state, ctx, channel_id, deleted_message_id, guild_id)
            .await;
    }

    /// Called when a thread is created or the bot is added to one
    async fn thread_create(&self, ctx: Context, thread: GuildChannel) {
        thread::handle_thread_create(&self.state, ctx, thread).await;
    }

    /// Called for slash commands, context commands and message components
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        interaction::handle_interaction(&self.state, ctx, interaction).await;
    }
}
