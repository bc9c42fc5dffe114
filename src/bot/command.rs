//! Application command definitions and option extraction.

use serenity::all::{
    CommandDataOptionValue, CommandInteraction, CommandOptionType, CommandType, Context,
    CreateCommand, CreateCommandOption, RoleId, UserId,
};

use crate::config::Config;
use crate::error::AppError;

pub const PING: &str = "ping";
pub const ADD_ROLE: &str = "addrole";
pub const REMOVE_ROLE: &str = "removerole";
pub const LIST_ROLE: &str = "listrole";
pub const REPORT_MESSAGE: &str = "Report Message";
pub const SUGGESTION: &str = "suggestion";

/// Discord caps the number of choices on one option.
const MAX_CHOICES: usize = 25;

/// Every command the bot handles.
///
/// `suggestion` is only registered when leadership channels are configured; its
/// team choices come from that list.
pub fn commands(config: &Config) -> Vec<CreateCommand> {
    let mut commands = vec![
        CreateCommand::new(PING).description("Respond with pong"),
        CreateCommand::new(ADD_ROLE)
            .description("Add a role to a user")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    "target",
                    "The user to add the role to",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "The role to add to the user",
                )
                .required(true),
            ),
        CreateCommand::new(REMOVE_ROLE)
            .description("Remove a role from a user")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    "target",
                    "The user to remove the role from",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "The role to remove from the user",
                )
                .required(true),
            ),
        CreateCommand::new(LIST_ROLE)
            .description("List all members with a role")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "The role to list members for",
                )
                .required(true),
            ),
        CreateCommand::new(REPORT_MESSAGE).kind(CommandType::Message),
    ];

    if !config.leadership_channels.is_empty() {
        if config.leadership_channels.len() > MAX_CHOICES {
            tracing::warn!(
                "Only the first {} leadership channels are offered as suggestion teams",
                MAX_CHOICES
            );
        }
        let team = config
            .leadership_channels
            .iter()
            .take(MAX_CHOICES)
            .fold(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "team",
                    "The team to send the suggestion to",
                )
                .required(true),
                |option, channel| option.add_string_choice(&channel.name, &channel.name),
            );

        commands.push(
            CreateCommand::new(SUGGESTION)
                .description("Submit a suggestion for the server")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "suggestion",
                        "The suggestion to submit",
                    )
                    .required(true),
                )
                .add_option(team),
        );
    }

    commands
}

/// Replaces the configured guild's command set with `commands()`.
pub async fn register_commands(ctx: &Context, config: &Config) -> Result<(), AppError> {
    let registered = config
        .guild_id
        .set_commands(&ctx.http, commands(config))
        .await?;

    for command in &registered {
        tracing::info!("Registered command: {}", command.name);
    }

    Ok(())
}

fn option<'a>(
    command: &'a CommandInteraction,
    name: &str,
) -> Result<&'a CommandDataOptionValue, AppError> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .map(|option| &option.value)
        .ok_or_else(|| AppError::BadRequest(format!("Missing `{}` option.", name)))
}

pub fn user_option(command: &CommandInteraction, name: &str) -> Result<UserId, AppError> {
    match option(command, name)? {
        CommandDataOptionValue::User(user_id) => Ok(*user_id),
        _ => Err(AppError::BadRequest(format!("`{}` must be a user.", name))),
    }
}

pub fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> Result<&'a str, AppError> {
    match option(command, name)? {
        CommandDataOptionValue::String(value) => Ok(value.as_str()),
        _ => Err(AppError::BadRequest(format!("`{}` must be text.", name))),
    }
}

pub fn role_option(command: &CommandInteraction, name: &str) -> Result<RoleId, AppError> {
    match option(command, name)? {
        CommandDataOptionValue::Role(role_id) => Ok(*role_id),
        _ => Err(AppError::BadRequest(format!("`{}` must be a role.", name))),
    }
}
