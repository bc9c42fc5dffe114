//! Self-service role selection menus.
//!
//! Open roles are offered through string-select menus posted once to the role
//! selection channel. Each menu covers at most 25 roles (Discord's option limit),
//! so a larger catalog is split over several menus numbered by custom id.

use serenity::all::{RoleId, UserId};
use std::collections::HashSet;

use crate::config::require;
use crate::error::AppError;
use crate::model::{
    notice::{Component, Notice, OutgoingMessage, SelectMenu, COLOR_GREEN},
    parse_snowflake,
};
use crate::service::gateway::DiscordGateway;
use crate::state::AppState;

pub const ROLE_SELECT_PREFIX: &str = "role_select:";

const MENU_TITLE: &str = "Role Selection";
const MENU_CHUNK_SIZE: usize = 25;
const MENU_LOOKBACK: u8 = 50;

/// Roles changed by one menu submission, by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SelectionResult {
    /// Private reply shown to the member who used the menu.
    pub fn reply(&self) -> String {
        let mut lines = Vec::new();
        if !self.added.is_empty() {
            lines.push(format!("Added: {}", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            lines.push(format!("Removed: {}", self.removed.join(", ")));
        }
        if lines.is_empty() {
            return "No role changes made.".to_string();
        }
        lines.join("\n")
    }
}

/// Menu index encoded in a `role_select:{n}` custom id.
pub fn menu_index(custom_id: &str) -> Option<usize> {
    custom_id.strip_prefix(ROLE_SELECT_PREFIX)?.parse().ok()
}

pub struct RoleSelectService<'a> {
    state: &'a AppState,
    discord: &'a dyn DiscordGateway,
}

impl<'a> RoleSelectService<'a> {
    pub fn new(state: &'a AppState, discord: &'a dyn DiscordGateway) -> Self {
        Self { state, discord }
    }

    /// Open roles split into menu-sized chunks, sorted by name.
    fn chunks(&self) -> Vec<Vec<(RoleId, String)>> {
        self.state
            .config
            .roles
            .open_roles()
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect::<Vec<_>>()
            .chunks(MENU_CHUNK_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// The full role selection message, also used to reset a menu after use.
    pub fn menu_message(&self) -> OutgoingMessage {
        let components = self
            .chunks()
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                Component::Select(SelectMenu {
                    custom_id: format!("{}{}", ROLE_SELECT_PREFIX, index),
                    placeholder: "Choose roles...".to_string(),
                    options: chunk
                        .into_iter()
                        .map(|(id, name)| (name, id.to_string()))
                        .collect(),
                })
            })
            .collect();

        let notice = Notice::new(MENU_TITLE, COLOR_GREEN).description(
            "Select the roles you would like to have. Deselect a role to have it removed.",
        );
        OutgoingMessage::notice(notice).with_components(components)
    }

    /// Posts the menu unless a recent message in the channel already carries it.
    ///
    /// # Returns
    /// - `Ok(true)` - Menu posted
    /// - `Ok(false)` - Menu already present or no open roles configured
    /// - `Err(AppError::Misconfigured)` - No role selection channel configured
    pub async fn post_menu(&self) -> Result<bool, AppError> {
        let channel = require(
            self.state.config.role_selection_channel_id,
            "ROLE_SELECTION_CHANNEL_ID",
        )?;
        if self.state.config.roles.open_roles().is_empty() {
            tracing::info!("No open roles configured, skipping role selection menu");
            return Ok(false);
        }

        match self.discord.fetch_messages(channel, MENU_LOOKBACK).await {
            Ok(recent) => {
                let exists = recent.iter().any(|message| {
                    message
                        .embeds
                        .first()
                        .is_some_and(|embed| embed.title.as_deref() == Some(MENU_TITLE))
                });
                if exists {
                    tracing::info!("Role selection menu already posted in {}", channel);
                    return Ok(false);
                }
            }
            Err(e) => tracing::warn!("Failed to check for existing role menu: {}", e),
        }

        self.discord.send_message(channel, self.menu_message()).await?;
        tracing::info!("Posted role selection menu to {}", channel);
        Ok(true)
    }

    /// Brings `user`'s roles within one menu in line with what they selected.
    ///
    /// Only roles offered by menu `index` are touched; values not offered by it
    /// are ignored. Individual role failures are logged and left out of the result.
    ///
    /// # Arguments
    /// - `user` - Member who submitted the menu
    /// - `index` - Menu number from the custom id
    /// - `values` - Selected option values (role ids)
    pub async fn on_selection(
        &self,
        user: UserId,
        index: usize,
        values: &[String],
    ) -> Result<SelectionResult, AppError> {
        let Some(chunk) = self.chunks().into_iter().nth(index) else {
            return Err(AppError::BadRequest(
                "This role menu is out of date.".to_string(),
            ));
        };

        let member = self.discord.fetch_member(user).await?;
        let selected: HashSet<RoleId> = values
            .iter()
            .filter_map(|value| parse_snowflake(value))
            .map(RoleId::new)
            .collect();

        let mut result = SelectionResult::default();
        for (role, name) in chunk {
            let has = member.has_role(role);
            let wants = selected.contains(&role);

            if wants && !has {
                match self.discord.add_role(user, role, "Role selection menu").await {
                    Ok(()) => result.added.push(name),
                    Err(e) => tracing::warn!("Failed to add role {} to {}: {}", role, user, e),
                }
            } else if has && !wants {
                match self.discord.remove_role(user, role, "Role selection menu").await {
                    Ok(()) => result.removed.push(name),
                    Err(e) => tracing::warn!("Failed to remove role {} from {}: {}", role, user, e),
                }
            }
        }

        tracing::debug!("Role menu {} for {}: {:?}", index, user, result);
        Ok(result)
    }
}
