//! Process-lifetime configuration loaded from environment variables.
//!
//! A `.env` file is loaded by `main` through `dotenvy` before `Config::from_env`
//! runs. Required keys abort startup when missing; optional keys only disable
//! the feature that needs them, which is reported once here and again as
//! `AppError::Misconfigured` when the feature is used.

use serenity::all::{ChannelId, GuildId, RoleId};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{config::ConfigError, AppError};
use crate::model::{parse_snowflake, role::RoleCatalog};

const DEFAULT_MEMBER_CACHE_UPDATE_DELAY_MS: u64 = 1000;
/// Every ten minutes, on the minute.
const DEFAULT_MEMBER_COUNT_SCHEDULE: &str = "0 */10 * * * *";

/// A leadership team that can receive suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadershipChannel {
    /// Team name offered as a choice on the `suggestion` command.
    pub name: String,
    pub channel_id: ChannelId,
}

/// Which permission check guards `addrole`/`removerole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequesterCheck {
    /// Only the per-role approval flag gates a change.
    RoleFlag,
    /// Deprecated: the requester must also hold the approver role.
    ApproverGate,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub guild_id: GuildId,

    pub approver_role_id: RoleId,
    pub community_member_role_id: RoleId,
    pub moderator_role_id: Option<RoleId>,
    pub djs_member_role_id: Option<RoleId>,

    pub audit_log_channel_id: ChannelId,
    pub access_control_channel_id: ChannelId,
    pub moderation_channel_id: Option<ChannelId>,
    pub community_general_channel_id: Option<ChannelId>,
    pub role_selection_channel_id: Option<ChannelId>,
    pub djs_app_forum_channel_id: Option<ChannelId>,
    pub ticket_channel_id: Option<ChannelId>,
    pub embed_remove_channels: HashSet<ChannelId>,
    /// Suggestion targets, in the order they are offered.
    pub leadership_channels: Vec<LeadershipChannel>,

    pub roles: RoleCatalog,

    /// Delay before a gateway-observed member update is written to the cache.
    pub member_cache_update_delay: Duration,
    /// Cron expression (with seconds) for the member-count presence job.
    pub member_count_schedule: String,
    pub requester_check: RequesterCheck,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let required = |key: &str| {
            get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let required_id = |key: &str| -> Result<u64, ConfigError> {
            let value = required(key)?;
            parse_id(key, &value)
        };
        let optional_id = |key: &str| -> Result<Option<u64>, ConfigError> {
            get(key).map(|value| parse_id(key, &value)).transpose()
        };

        let mut roles = RoleCatalog::new();
        if let Some(value) = get("OPEN_ROLES") {
            for (id, name) in parse_id_map("OPEN_ROLES", &value)? {
                roles = roles.with_open_role(RoleId::new(id), name);
            }
        }
        if let Some(value) = get("ROLES_REQUIRING_APPROVAL") {
            for (id, name) in parse_id_map("ROLES_REQUIRING_APPROVAL", &value)? {
                roles = roles.with_approval_role(RoleId::new(id), name);
            }
        }
        if let Some(value) = get("APPROVED_ROLES") {
            for (id, name) in parse_id_map("APPROVED_ROLES", &value)? {
                roles = roles.with_restricted_role(RoleId::new(id), name);
            }
        }

        let member_cache_update_delay = match get("MEMBER_CACHE_UPDATE_DELAY_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                name: "MEMBER_CACHE_UPDATE_DELAY_MS".to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_MEMBER_CACHE_UPDATE_DELAY_MS,
        };

        let requester_check = match get("REQUESTER_CHECK").as_deref().map(str::trim) {
            None | Some("role_flag") => RequesterCheck::RoleFlag,
            Some("approver_gate") => RequesterCheck::ApproverGate,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "REQUESTER_CHECK".to_string(),
                    value: other.to_string(),
                    reason: "expected role_flag or approver_gate".to_string(),
                }
                .into())
            }
        };

        let embed_remove_channels = match get("EMBED_REMOVE_CHANNELS") {
            Some(value) => value
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(|part| parse_id("EMBED_REMOVE_CHANNELS", part).map(ChannelId::new))
                .collect::<Result<HashSet<_>, _>>()?,
            None => HashSet::new(),
        };

        let leadership_channels = match get("LEADERSHIP_CHANNELS") {
            Some(value) => parse_id_map("LEADERSHIP_CHANNELS", &value)?
                .into_iter()
                .map(|(id, name)| {
                    if name.is_empty() {
                        return Err(ConfigError::InvalidValue {
                            name: "LEADERSHIP_CHANNELS".to_string(),
                            value: id.to_string(),
                            reason: "expected id=Team Name".to_string(),
                        });
                    }
                    Ok(LeadershipChannel {
                        name,
                        channel_id: ChannelId::new(id),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            discord_token: required("DISCORD_BOT_TOKEN")?,
            guild_id: GuildId::new(required_id("DISCORD_GUILD_ID")?),
            approver_role_id: RoleId::new(required_id("ROLE_APPROVER_ID")?),
            community_member_role_id: RoleId::new(required_id("COMMUNITY_MEMBER_ROLE_ID")?),
            moderator_role_id: optional_id("MODERATOR_ROLE_ID")?.map(RoleId::new),
            djs_member_role_id: optional_id("DJS_MEMBER_ROLE_ID")?.map(RoleId::new),
            audit_log_channel_id: ChannelId::new(required_id("AUDIT_LOG_CHANNEL_ID")?),
            access_control_channel_id: ChannelId::new(required_id("ACCESS_CONTROL_CHANNEL_ID")?),
            moderation_channel_id: optional_id("MODERATION_CHANNEL_ID")?.map(ChannelId::new),
            community_general_channel_id: optional_id("COMMUNITY_GENERAL_CHANNEL_ID")?
                .map(ChannelId::new),
            role_selection_channel_id: optional_id("ROLE_SELECTION_CHANNEL_ID")?
                .map(ChannelId::new),
            djs_app_forum_channel_id: optional_id("DJS_APP_FORUM_CHANNEL_ID")?
                .map(ChannelId::new),
            ticket_channel_id: optional_id("TICKET_CHANNEL_ID")?.map(ChannelId::new),
            embed_remove_channels,
            leadership_channels,
            roles,
            member_cache_update_delay: Duration::from_millis(member_cache_update_delay),
            member_count_schedule: get("MEMBER_COUNT_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_MEMBER_COUNT_SCHEDULE.to_string()),
            requester_check,
        })
    }

    /// Logs a warning for every optional feature disabled by missing configuration.
    pub fn log_disabled_features(&self) {
        let optional = [
            ("MODERATOR_ROLE_ID", self.moderator_role_id.is_some()),
            ("MODERATION_CHANNEL_ID", self.moderation_channel_id.is_some()),
            (
                "COMMUNITY_GENERAL_CHANNEL_ID",
                self.community_general_channel_id.is_some(),
            ),
            (
                "ROLE_SELECTION_CHANNEL_ID",
                self.role_selection_channel_id.is_some(),
            ),
            (
                "DJS_APP_FORUM_CHANNEL_ID",
                self.djs_app_forum_channel_id.is_some(),
            ),
            ("DJS_MEMBER_ROLE_ID", self.djs_member_role_id.is_some()),
            ("TICKET_CHANNEL_ID", self.ticket_channel_id.is_some()),
            ("LEADERSHIP_CHANNELS", !self.leadership_channels.is_empty()),
        ];

        for (key, _) in optional.iter().filter(|(_, present)| !present) {
            tracing::warn!("{} is not set, the feature that depends on it is disabled", key);
        }

        tracing::info!(
            "{} open roles, {} roles requiring approval",
            self.roles.open_roles().len(),
            self.roles.approval_roles().len()
        );
        if self.roles.open_roles().is_empty() {
            tracing::warn!("OPEN_ROLES is empty, the role selection menu will not be posted");
        }
        if self.requester_check == RequesterCheck::ApproverGate {
            tracing::warn!(
                "REQUESTER_CHECK=approver_gate is deprecated, role commands will require the approver role"
            );
        }
    }
}

/// Unwraps an optional config value for an operation that cannot run without it.
pub fn require<T>(value: Option<T>, key: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Misconfigured(key.to_string()))
}

fn parse_id(key: &str, value: &str) -> Result<u64, ConfigError> {
    parse_snowflake(value).ok_or_else(|| ConfigError::InvalidValue {
        name: key.to_string(),
        value: value.to_string(),
        reason: "expected a non-zero Discord id".to_string(),
    })
}

/// Parses `id=Name,id=Name` (or bare `id`) pairs.
fn parse_id_map(key: &str, value: &str) -> Result<Vec<(u64, String)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (id, name) = part.split_once('=').unwrap_or((part, ""));
            Ok((parse_id(key, id)?, name.trim().to_string()))
        })
        .collect()
}
