//! Serenity-backed `DiscordGateway`.

use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    CreateMessage,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, EditMessage, GetMessages,
    GuildId, Http, RoleId, Timestamp, UserId,
};
use serenity::async_trait;
use serenity::http::HttpError;
use serenity::model::guild::audit_log::{Action, MemberAction};
use std::sync::Arc;

use crate::error::AppError;
use crate::model::{
    audit::AuditEntry,
    member::Member,
    message::{ChannelMessage, MessageRef},
    notice::{ButtonKind, Component, Notice, OutgoingMessage},
};
use crate::service::gateway::DiscordGateway;

/// Gateway bound to one guild over Serenity's HTTP client.
pub struct SerenityGateway {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

/// Maps a failed API call onto the domain error taxonomy.
///
/// A 404 becomes `NotFound` naming `what`, any other rejected request becomes a
/// `CollaboratorFailure` carrying Discord's status and message. Transport and
/// client-side errors stay boxed Serenity errors.
fn api_error(err: serenity::Error, what: impl FnOnce() -> String) -> AppError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            if response.status_code.as_u16() == 404 {
                AppError::NotFound(what())
            } else {
                AppError::CollaboratorFailure(format!(
                    "{} {}: {}",
                    response.status_code, response.url, response.error.message
                ))
            }
        }
        _ => AppError::from(err),
    }
}

fn build_embed(notice: &Notice) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&notice.title).color(notice.color);
    if let Some(description) = &notice.description {
        embed = embed.description(description);
    }
    for field in &notice.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &notice.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(timestamp) = notice.timestamp {
        match Timestamp::from_unix_timestamp(timestamp.timestamp()) {
            Ok(timestamp) => embed = embed.timestamp(timestamp),
            Err(e) => tracing::warn!("Dropping invalid embed timestamp: {}", e),
        }
    }
    embed
}

/// Converts component rows into Serenity action rows.
pub fn build_components(components: &[Component]) -> Vec<CreateActionRow> {
    components
        .iter()
        .map(|component| match component {
            Component::Buttons(buttons) => CreateActionRow::Buttons(
                buttons
                    .iter()
                    .map(|button| {
                        let style = match button.kind {
                            ButtonKind::Primary => ButtonStyle::Primary,
                            ButtonKind::Danger => ButtonStyle::Danger,
                        };
                        CreateButton::new(&button.custom_id)
                            .label(&button.label)
                            .style(style)
                    })
                    .collect(),
            ),
            Component::Select(menu) => {
                let options = menu
                    .options
                    .iter()
                    .map(|(label, value)| CreateSelectMenuOption::new(label, value))
                    .collect();
                CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(&menu.custom_id, CreateSelectMenuKind::String { options })
                        .placeholder(&menu.placeholder)
                        .min_values(0)
                        .max_values(menu.options.len().min(25) as u8),
                )
            }
        })
        .collect()
}

/// Embed list for an outgoing message, shared with interaction responses.
pub fn build_embeds(message: &OutgoingMessage) -> Vec<CreateEmbed> {
    message.notice.iter().map(build_embed).collect()
}

#[async_trait]
impl DiscordGateway for SerenityGateway {
    async fn fetch_member(&self, user_id: UserId) -> Result<Member, AppError> {
        let member = self
            .guild_id
            .member(&self.http, user_id)
            .await
            .map_err(|e| api_error(e, || format!("member {}", user_id)))?;
        Ok(Member::from_serenity(&member))
    }

    async fn list_members(
        &self,
        after: Option<UserId>,
        limit: u64,
    ) -> Result<Vec<Member>, AppError> {
        let members = self.guild_id.members(&self.http, Some(limit), after).await?;
        Ok(members.iter().map(Member::from_serenity).collect())
    }

    async fn add_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), AppError> {
        self.http
            .add_member_role(self.guild_id, user_id, role_id, Some(reason))
            .await
            .map_err(|e| api_error(e, || format!("member {} or role {}", user_id, role_id)))?;
        Ok(())
    }

    async fn remove_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), AppError> {
        self.http
            .remove_member_role(self.guild_id, user_id, role_id, Some(reason))
            .await
            .map_err(|e| api_error(e, || format!("member {} or role {}", user_id, role_id)))?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageRef, AppError> {
        let mut builder = CreateMessage::new()
            .embeds(build_embeds(&message))
            .components(build_components(&message.components));
        if let Some(content) = &message.content {
            builder = builder.content(content);
        }

        let sent = channel_id
            .send_message(&self.http, builder)
            .await
            .map_err(|e| api_error(e, || format!("channel {}", channel_id)))?;
        Ok(MessageRef::new(sent.channel_id, sent.id))
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        edit: OutgoingMessage,
    ) -> Result<(), AppError> {
        let mut builder = EditMessage::new().components(build_components(&edit.components));
        if let Some(content) = &edit.content {
            builder = builder.content(content);
        }
        if edit.notice.is_some() {
            builder = builder.embeds(build_embeds(&edit));
        }

        message
            .channel_id
            .edit_message(&self.http, message.message_id, builder)
            .await?;
        Ok(())
    }

    async fn pin_message(&self, message: MessageRef) -> Result<(), AppError> {
        message
            .channel_id
            .pin(&self.http, message.message_id)
            .await?;
        Ok(())
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, AppError> {
        let messages = channel_id
            .messages(&self.http, GetMessages::new().limit(limit))
            .await?;
        Ok(messages.iter().map(ChannelMessage::from_serenity).collect())
    }

    async fn fetch_message(&self, message: MessageRef) -> Result<ChannelMessage, AppError> {
        let fetched = message
            .channel_id
            .message(&self.http, message.message_id)
            .await
            .map_err(|e| api_error(e, || format!("message {}", message.message_id)))?;
        Ok(ChannelMessage::from_serenity(&fetched))
    }

    async fn suppress_embeds(&self, message: MessageRef) -> Result<(), AppError> {
        message
            .channel_id
            .edit_message(
                &self.http,
                message.message_id,
                EditMessage::new().suppress_embeds(true),
            )
            .await?;
        Ok(())
    }

    async fn role_update_audit_entries(&self, limit: u8) -> Result<Vec<AuditEntry>, AppError> {
        let logs = self
            .guild_id
            .audit_logs(
                &self.http,
                Some(Action::Member(MemberAction::RoleUpdate)),
                None,
                None,
                Some(limit),
            )
            .await?;

        Ok(logs
            .entries
            .iter()
            .map(|entry| AuditEntry {
                id: entry.id.get(),
                target: entry.target_id.map(|target| UserId::new(target.get())),
                actor: entry.user_id,
            })
            .collect())
    }

    async fn is_bot(&self, user_id: UserId) -> Result<bool, AppError> {
        let user = self
            .http
            .get_user(user_id)
            .await
            .map_err(|e| api_error(e, || format!("user {}", user_id)))?;
        Ok(user.bot)
    }
}
