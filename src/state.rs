//! Application state shared across all event handlers.
//!
//! `AppState` is built once in `main` and handed to the Serenity event handler.
//! Every field is cheap to clone (reference counted internally), so handlers
//! and deferred tasks each hold their own copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::data::{
    approval_ledger::ApprovalLedger, member_cache::MemberCache, message_cache::MessageCache,
    role_command_cache::RoleCommandCache, thread_registry::ThreadRegistry,
};
use crate::scheduler::deferred::DeferredTasks;
use crate::service::gateway::{IdClock, SnowflakeClock};

#[derive(Clone)]
pub struct AppState {
    /// Static configuration loaded at startup.
    pub config: Arc<Config>,

    /// Last-known member role sets, the "before" side of every diff.
    pub members: MemberCache,

    /// Recently seen messages, used to report deleted content.
    pub messages: MessageCache,

    /// Invokers of recent role commands.
    pub role_commands: RoleCommandCache,

    /// Pending and resolved approval requests.
    pub approvals: ApprovalLedger,

    /// Threads already processed by the forum and ticket handlers.
    pub threads: ThreadRegistry,

    /// Deferred and background work tied to the process lifetime.
    pub tasks: DeferredTasks,

    /// Timestamp decoder for audit-log entry ids.
    pub id_clock: Arc<dyn IdClock>,

    /// Set once the first ready event has run its one-time setup.
    started: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SnowflakeClock))
    }

    pub fn with_clock(config: Config, id_clock: Arc<dyn IdClock>) -> Self {
        let tasks = DeferredTasks::new();
        Self {
            config: Arc::new(config),
            members: MemberCache::default(),
            messages: MessageCache::default(),
            role_commands: RoleCommandCache::new(tasks.clone()),
            approvals: ApprovalLedger::new(),
            threads: ThreadRegistry::new(),
            tasks,
            id_clock,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true only for the first caller; reconnects skip one-time setup.
    pub fn mark_started(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }
}
