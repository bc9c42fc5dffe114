//! Test factory for creating Serenity Member objects.

use serenity::all::Member;

use super::user::user_json;

/// Guild id used for every member created by this factory.
pub const TEST_GUILD_ID: u64 = 1;

/// Creates a test Serenity Member of the test guild.
///
/// Role ids are passed through as given, duplicates included, so callers can
/// check how conversions treat them.
///
/// # Arguments
/// - `user_id` - Discord user ID (snowflake)
/// - `username` - Username of the underlying user
/// - `nick` - Optional guild nickname
/// - `roles` - Role ids held by the member
///
/// # Panics
/// - If the JSON cannot be deserialized into a Member (indicates invalid test data)
///
/// # Examples
///
/// ```rust,ignore
/// use test_utils::serenity::create_test_member;
///
/// let member = create_test_member(42, "someone", Some("Nick"), &[100, 200]);
/// assert_eq!(member.display_name(), "Nick");
/// ```
pub fn create_test_member(
    user_id: u64,
    username: &str,
    nick: Option<&str>,
    roles: &[u64],
) -> Member {
    let roles: Vec<String> = roles.iter().map(|role| role.to_string()).collect();

    serde_json::from_value(serde_json::json!({
        "user": user_json(user_id, username, false),
        "nick": nick,
        "avatar": null,
        "roles": roles,
        "joined_at": "2024-01-01T00:00:00.000000+00:00",
        "premium_since": null,
        "deaf": false,
        "mute": false,
        "flags": 0,
        "pending": false,
        "permissions": null,
        "communication_disabled_until": null,
        "guild_id": TEST_GUILD_ID.to_string(),
    }))
    .expect("Failed to create test member from JSON")
}
