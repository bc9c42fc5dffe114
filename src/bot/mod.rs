//! Discord gateway connection and event routing.
//!
//! The bot connects to a single configured guild. Events are converted into
//! domain types in `handler` and passed on to the services; outbound calls go
//! through `gateway::SerenityGateway`.
//!
//! # Gateway Intents
//!
//! The bot requires the following gateway intents:
//! - `GUILDS` - Receive thread creation events
//! - `GUILD_MEMBERS` - Receive member join, leave and update events (privileged intent)
//! - `GUILD_MESSAGES` - Receive message create, update and delete events
//! - `MESSAGE_CONTENT` - Read message text for the deleted-message log and link detection (privileged intent)
//!
//! Note: privileged intents must be explicitly enabled in the Discord Developer
//! Portal for the bot application.

pub mod command;
pub mod gateway;
pub mod handler;
pub mod start;
