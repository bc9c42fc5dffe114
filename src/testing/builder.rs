use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::fake::FakeDiscord;
use crate::config::{Config, LeadershipChannel, RequesterCheck};
use crate::error::internal::InternalError;
use crate::model::{member::Member, role::RoleCatalog};
use crate::service::gateway::{DiscordGateway, IdClock, SnowflakeClock};
use crate::state::AppState;

pub const GUILD_ID: u64 = 1;

pub const APPROVER_ROLE: u64 = 100;
pub const COMMUNITY_ROLE: u64 = 101;
pub const MODERATOR_ROLE: u64 = 102;
pub const DJS_MEMBER_ROLE: u64 = 103;
/// Listed as requiring approval.
pub const GATED_ROLE: u64 = 200;
/// Not in the role catalog at all.
pub const PLAIN_ROLE: u64 = 201;
/// Listed under `APPROVED_ROLES`: flagged on leave, not gated.
pub const RESTRICTED_ROLE: u64 = 202;
pub const OPEN_ROLE: u64 = 300;
pub const OPEN_ROLE_2: u64 = 301;

pub const AUDIT_CHANNEL: u64 = 500;
pub const ACCESS_CHANNEL: u64 = 501;
pub const MODERATION_CHANNEL: u64 = 502;
pub const GENERAL_CHANNEL: u64 = 503;
pub const ROLE_SELECTION_CHANNEL: u64 = 504;
pub const DJS_FORUM_CHANNEL: u64 = 505;
pub const TICKET_CHANNEL: u64 = 506;
pub const EMBED_CHANNEL: u64 = 507;
pub const ROCKET_CHANNEL: u64 = 508;
pub const GRAVITY_CHANNEL: u64 = 509;

/// Fully populated configuration with every optional feature enabled.
pub fn test_config() -> Config {
    Config {
        discord_token: "test-token".to_string(),
        guild_id: GuildId::new(GUILD_ID),
        approver_role_id: RoleId::new(APPROVER_ROLE),
        community_member_role_id: RoleId::new(COMMUNITY_ROLE),
        moderator_role_id: Some(RoleId::new(MODERATOR_ROLE)),
        djs_member_role_id: Some(RoleId::new(DJS_MEMBER_ROLE)),
        audit_log_channel_id: ChannelId::new(AUDIT_CHANNEL),
        access_control_channel_id: ChannelId::new(ACCESS_CHANNEL),
        moderation_channel_id: Some(ChannelId::new(MODERATION_CHANNEL)),
        community_general_channel_id: Some(ChannelId::new(GENERAL_CHANNEL)),
        role_selection_channel_id: Some(ChannelId::new(ROLE_SELECTION_CHANNEL)),
        djs_app_forum_channel_id: Some(ChannelId::new(DJS_FORUM_CHANNEL)),
        ticket_channel_id: Some(ChannelId::new(TICKET_CHANNEL)),
        embed_remove_channels: HashSet::from([ChannelId::new(EMBED_CHANNEL)]),
        leadership_channels: vec![
            LeadershipChannel {
                name: "Rocket".to_string(),
                channel_id: ChannelId::new(ROCKET_CHANNEL),
            },
            LeadershipChannel {
                name: "Gravity".to_string(),
                channel_id: ChannelId::new(GRAVITY_CHANNEL),
            },
        ],
        roles: RoleCatalog::new()
            .with_approval_role(RoleId::new(GATED_ROLE), "Officer")
            .with_restricted_role(RoleId::new(RESTRICTED_ROLE), "Veteran")
            .with_open_role(RoleId::new(OPEN_ROLE), "Arena")
            .with_open_role(RoleId::new(OPEN_ROLE_2), "Raid"),
        member_cache_update_delay: Duration::from_millis(1000),
        member_count_schedule: "0 */10 * * * *".to_string(),
        requester_check: RequesterCheck::RoleFlag,
    }
}

/// Builds a member named `member-{id}` holding `roles`.
pub fn member(id: u64, roles: &[u64]) -> Member {
    Member::new(
        UserId::new(id),
        format!("member-{}", id),
        roles.iter().map(|role| RoleId::new(*role)),
    )
}

/// Id clock with a frozen "now"; id timestamps decode like real snowflakes.
pub struct FixedClock {
    pub now: DateTime<Utc>,
}

impl IdClock for FixedClock {
    fn timestamp_of(&self, id: u64) -> Result<DateTime<Utc>, InternalError> {
        SnowflakeClock.timestamp_of(id)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Builder for test contexts backed by `FakeDiscord`.
///
/// # Example
///
/// ```rust,ignore
/// let test = TestBuilder::new()
///     .with_member(member(1, &[COMMUNITY_ROLE]))
///     .build()
///     .await;
/// ```
pub struct TestBuilder {
    config: Config,
    clock: Option<Arc<dyn IdClock>>,
    members: Vec<Member>,
    cached: Vec<Member>,
}

impl TestBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            clock: None,
            members: Vec::new(),
            cached: Vec::new(),
        }
    }

    pub fn with_config(mut self, configure: impl FnOnce(&mut Config)) -> Self {
        configure(&mut self.config);
        self
    }

    /// Adds a member known to the fake API only.
    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Adds a member to both the fake API and the member cache.
    pub fn with_cached_member(mut self, member: Member) -> Self {
        self.members.push(member.clone());
        self.cached.push(member);
        self
    }

    pub fn with_clock(mut self, clock: impl IdClock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub async fn build(self) -> TestContext {
        let state = match self.clock {
            Some(clock) => AppState::with_clock(self.config, clock),
            None => AppState::new(self.config),
        };
        let discord = Arc::new(FakeDiscord::new());

        for member in self.members {
            discord.add_member(member);
        }
        for member in self.cached {
            state.members.put(member).await;
        }

        TestContext { state, discord }
    }
}

pub struct TestContext {
    pub state: AppState,
    pub discord: Arc<FakeDiscord>,
}

impl TestContext {
    pub fn gateway(&self) -> &dyn DiscordGateway {
        self.discord.as_ref()
    }

    /// Owned handle for services that schedule deferred work.
    pub fn shared_gateway(&self) -> Arc<dyn DiscordGateway> {
        self.discord.clone()
    }
}
