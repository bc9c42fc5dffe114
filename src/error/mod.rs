//! Error types and user-facing failure mapping.
//!
//! This module provides the bot's error hierarchy. `AppError` is the top-level
//! error type that wraps domain-specific errors and knows how to turn itself into
//! the private reply shown to whoever triggered the failed action. Outcomes that
//! are normal results of a request (a role already present, an approval already
//! resolved) are not errors and live on the service outcome enums instead.

pub mod config;
pub mod internal;

use thiserror::Error;

use crate::error::{config::ConfigError, internal::InternalError};

/// Top-level application error type.
///
/// Aggregates all possible error types that can occur while handling a gateway
/// event or interaction. Most variants use `#[from]` for automatic conversion.
/// Domain variants (`NotFound`, `Unauthorized`, `Misconfigured`,
/// `CollaboratorFailure`) carry a message describing the cause for logging.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Internal invariant violation, indicating a bug or malformed input we produced.
    #[error(transparent)]
    InternalErr(#[from] InternalError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size. Treated as a collaborator failure.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Member, channel or message is missing.
    #[error("{0}")]
    NotFound(String),

    /// The acting user lacks the role required for the action.
    ///
    /// The message is shown to the actor verbatim.
    #[error("{0}")]
    Unauthorized(String),

    /// A configuration key required by this specific operation is absent.
    #[error("Missing configuration: {0}")]
    Misconfigured(String),

    /// A call to the chat platform failed for a reason other than a Serenity error.
    #[error("{0}")]
    CollaboratorFailure(String),

    /// The request itself is invalid (e.g. approval requested for an ungated role).
    #[error("{0}")]
    BadRequest(String),
}

/// Manual conversion from serenity::Error to AppError.
///
/// Boxes the error to reduce the size of the AppError enum, as serenity::Error
/// is very large and would make all AppError variants larger if not boxed.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}

impl AppError {
    /// Returns true when the failure came from an outbound platform call.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::DiscordErr(_) | Self::CollaboratorFailure(_))
    }

    /// Converts the error into the private reply shown to the initiating actor.
    ///
    /// `Unauthorized` and `BadRequest` messages are written for end users and are
    /// passed through. Everything else is logged in full and replaced with a
    /// generic message to avoid leaking platform or configuration details.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                "Could not find the requested member or message.".to_string()
            }
            Self::Misconfigured(key) => {
                tracing::error!("Operation aborted, {} is not configured", key);
                "This feature is not configured on this server.".to_string()
            }
            err if err.is_collaborator_failure() => {
                tracing::warn!("Discord call failed: {}", err);
                "Discord could not complete the request, please try again later.".to_string()
            }
            err => {
                tracing::error!("{}", err);
                "Something went wrong while processing your request.".to_string()
            }
        }
    }
}
