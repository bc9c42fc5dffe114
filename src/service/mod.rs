//! Business logic for the bot's gateway events and interactions.
//!
//! Services are thin, per-call structs borrowing the shared `AppState` and a
//! `DiscordGateway`. Handlers in `bot::handler` build one per event, convert the
//! Serenity payload into domain types and call into it. Services that defer work
//! past the end of the event (`ThreadService`, `EmbedFilter`) own their handles.

pub mod approval;
pub mod attribution;
pub mod embed_filter;
pub mod gateway;
pub mod member_update;
pub mod membership;
pub mod message_log;
pub mod report;
pub mod role_change;
pub mod role_list;
pub mod role_select;
pub mod suggestion;
pub mod thread;
pub mod welcome;
