//! Slash command, context command and component routing.
//!
//! Every reply goes back privately to whoever triggered the interaction. Handlers
//! that make several API calls defer first so Discord's three second
//! acknowledgement window is never the limiting factor.

use serenity::all::{
    CommandInteraction, ComponentInteraction, ComponentInteractionDataKind, Context,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, Interaction, MessageId,
};

use crate::bot::command::{self, role_option, string_option, user_option};
use crate::bot::gateway::{build_components, build_embeds};
use crate::error::AppError;
use crate::model::{
    approval::{CorrelationId, RoleAction},
    message::MessageRef,
    notice::truncate,
};
use crate::service::{
    approval::ApprovalService,
    report::{ReportService, REPORT_REPLY},
    role_change::RoleChangeService,
    role_list::RoleListService,
    role_select::{menu_index, RoleSelectService},
    suggestion::SuggestionService,
};
use crate::state::AppState;

use super::{gateway, is_home_guild};

/// Discord rejects message content longer than this.
const MAX_REPLY_LEN: usize = 2000;

/// Handles the interaction_create event
pub async fn handle_interaction(state: &AppState, ctx: Context, interaction: Interaction) {
    let result = match interaction {
        Interaction::Command(command) if is_home_guild(state, command.guild_id) => {
            handle_command(state, &ctx, &command).await
        }
        Interaction::Component(component) if is_home_guild(state, component.guild_id) => {
            handle_component(state, &ctx, &component).await
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        tracing::error!("Failed to respond to interaction: {}", e);
    }
}

async fn handle_command(
    state: &AppState,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    match command.data.name.as_str() {
        command::PING => {
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new().content("Pong!"),
                    ),
                )
                .await?;
            Ok(())
        }
        command::ADD_ROLE => change_role(state, ctx, command, RoleAction::Add).await,
        command::REMOVE_ROLE => change_role(state, ctx, command, RoleAction::Remove).await,
        command::LIST_ROLE => list_role(state, ctx, command).await,
        command::REPORT_MESSAGE => report_message(state, ctx, command).await,
        command::SUGGESTION => suggest(state, ctx, command).await,
        other => {
            tracing::warn!("Received unknown command {}", other);
            Ok(())
        }
    }
}

async fn change_role(
    state: &AppState,
    ctx: &Context,
    command: &CommandInteraction,
    action: RoleAction,
) -> Result<(), AppError> {
    command.defer_ephemeral(&ctx.http).await?;

    let discord = gateway(state, ctx);
    let result = async {
        let target = user_option(command, "target")?;
        let role = role_option(command, "role")?;
        let service = RoleChangeService::new(state, discord.as_ref());
        let outcome = match action {
            RoleAction::Add => service.add_role(target, role, command.user.id).await?,
            RoleAction::Remove => service.remove_role(target, role, command.user.id).await?,
        };
        Ok::<_, AppError>(outcome.reply(action, target, role))
    }
    .await;

    edit_reply(ctx, command, reply_text(result)).await
}

async fn list_role(
    state: &AppState,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    command.defer_ephemeral(&ctx.http).await?;

    let discord = gateway(state, ctx);
    let result = async {
        let role = role_option(command, "role")?;
        RoleListService::new(state, discord.as_ref())
            .list(command.user.id, role)
            .await
    }
    .await;

    edit_reply(ctx, command, reply_text(result)).await
}

async fn suggest(
    state: &AppState,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    command.defer_ephemeral(&ctx.http).await?;

    let discord = gateway(state, ctx);
    let result = async {
        let suggestion = string_option(command, "suggestion")?;
        let team = string_option(command, "team")?;
        SuggestionService::new(state, discord.as_ref())
            .submit(&command.user.name, team, suggestion)
            .await
    }
    .await;

    edit_reply(ctx, command, reply_text(result)).await
}

async fn report_message(
    state: &AppState,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), AppError> {
    let discord = gateway(state, ctx);
    let result = async {
        let target = command
            .data
            .target_id
            .ok_or_else(|| AppError::BadRequest("No message selected.".to_string()))?;
        let message = MessageRef::new(command.channel_id, MessageId::new(target.get()));
        ReportService::new(state, discord.as_ref())
            .report(message)
            .await?;
        Ok::<_, AppError>(REPORT_REPLY.to_string())
    }
    .await;

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(reply_text(result))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_component(
    state: &AppState,
    ctx: &Context,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    let custom_id = component.data.custom_id.as_str();

    if let Some(index) = menu_index(custom_id) {
        return select_roles(state, ctx, component, index).await;
    }
    if CorrelationId::matches(custom_id) {
        return resolve_approval(state, ctx, component).await;
    }

    tracing::debug!("Ignoring component {}", custom_id);
    Ok(())
}

/// Applies a role menu submission and resets the menu for the next user.
async fn select_roles(
    state: &AppState,
    ctx: &Context,
    component: &ComponentInteraction,
    index: usize,
) -> Result<(), AppError> {
    let ComponentInteractionDataKind::StringSelect { values } = &component.data.kind else {
        return Ok(());
    };

    let discord = gateway(state, ctx);
    let service = RoleSelectService::new(state, discord.as_ref());

    let menu = service.menu_message();
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embeds(build_embeds(&menu))
                    .components(build_components(&menu.components)),
            ),
        )
        .await?;

    let result = service
        .on_selection(component.user.id, index, values)
        .await
        .map(|result| result.reply());

    component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(reply_text(result))
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn resolve_approval(
    state: &AppState,
    ctx: &Context,
    component: &ComponentInteraction,
) -> Result<(), AppError> {
    component.defer_ephemeral(&ctx.http).await?;

    let discord = gateway(state, ctx);
    let result = async {
        let id: CorrelationId = component.data.custom_id.parse()?;
        let card = MessageRef::new(component.channel_id, component.message.id);
        let outcome = ApprovalService::new(state, discord.as_ref())
            .resolve(id, component.user.id, card)
            .await?;
        Ok::<_, AppError>(outcome.reply().to_string())
    }
    .await;

    component
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().content(reply_text(result)),
        )
        .await?;
    Ok(())
}

async fn edit_reply(
    ctx: &Context,
    command: &CommandInteraction,
    text: String,
) -> Result<(), AppError> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(text))
        .await?;
    Ok(())
}

/// Success text, or the error's user-facing message, cut to Discord's limit.
fn reply_text(result: Result<String, AppError>) -> String {
    let text = result.unwrap_or_else(|e| e.user_message());
    truncate(text, MAX_REPLY_LEN)
}
