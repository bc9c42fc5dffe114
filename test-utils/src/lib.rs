//! Rolekeeper Test Utils
//!
//! Shared factories for building Serenity model objects in unit tests. Serenity
//! models have no public constructors for most of their fields, so the factories
//! deserialize JSON shaped like Discord's API responses instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::serenity::create_test_member;
//!
//! #[test]
//! fn converts_member() {
//!     let member = create_test_member(42, "someone", Some("Nick"), &[100, 200]);
//!     // Convert and assert...
//! }
//! ```

pub mod serenity;
