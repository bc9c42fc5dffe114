//! In-memory stores shared across handlers.
//!
//! Every store is an independent unit of consistency guarded by its own lock;
//! nothing here coordinates across stores.

pub mod approval_ledger;
pub mod member_cache;
pub mod message_cache;
pub mod role_command_cache;
pub mod thread_registry;
