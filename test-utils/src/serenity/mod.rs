//! Test factories for creating Serenity API objects.
//!
//! These factories create valid Serenity structs by deserializing JSON,
//! simulating what Discord's API would return, with sensible defaults for every
//! field the caller does not care about.
//!
//! # Available Factories
//!
//! - `user::create_test_user` - Create Serenity User objects
//! - `member::create_test_member` - Create Serenity Member objects
//! - `message::create_test_message` - Create Serenity Message objects

pub mod member;
pub mod message;
pub mod user;

pub use member::create_test_member;
pub use message::{create_test_message, TestEmbed};
pub use user::create_test_user;
