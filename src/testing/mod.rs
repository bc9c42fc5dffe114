//! Test fixtures: an in-memory Discord fake and a builder for wired-up state.

pub mod builder;
pub mod fake;

pub use builder::*;
pub use fake::BOT_USER_ID;
