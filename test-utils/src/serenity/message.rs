//! Test factory for creating Serenity Message objects.

use serenity::all::Message;

use super::{member::TEST_GUILD_ID, user::user_json};

/// Rich embed content for `create_test_message`.
#[derive(Debug, Clone, Default)]
pub struct TestEmbed {
    pub title: Option<String>,
    /// `(name, value)` pairs.
    pub fields: Vec<(String, String)>,
}

/// Creates a test Serenity Message in the test guild.
///
/// # Arguments
/// - `message_id` - Message ID (snowflake)
/// - `channel_id` - Channel the message was posted in
/// - `author_id` - Author user ID; the author is never a bot
/// - `content` - Message text
/// - `mentions` - IDs of mentioned users
/// - `embeds` - Rich embeds attached to the message
///
/// # Panics
/// - If the JSON cannot be deserialized into a Message (indicates invalid test data)
pub fn create_test_message(
    message_id: u64,
    channel_id: u64,
    author_id: u64,
    content: &str,
    mentions: &[u64],
    embeds: &[TestEmbed],
) -> Message {
    let mentions: Vec<_> = mentions
        .iter()
        .map(|id| user_json(*id, &format!("user-{}", id), false))
        .collect();
    let embeds: Vec<_> = embeds
        .iter()
        .map(|embed| {
            let fields: Vec<_> = embed
                .fields
                .iter()
                .map(|(name, value)| {
                    serde_json::json!({ "name": name, "value": value, "inline": false })
                })
                .collect();
            serde_json::json!({
                "type": "rich",
                "title": embed.title,
                "fields": fields,
            })
        })
        .collect();

    serde_json::from_value(serde_json::json!({
        "id": message_id.to_string(),
        "channel_id": channel_id.to_string(),
        "guild_id": TEST_GUILD_ID.to_string(),
        "author": user_json(author_id, &format!("user-{}", author_id), false),
        "content": content,
        "timestamp": "2024-01-01T00:00:00.000000+00:00",
        "edited_timestamp": null,
        "tts": false,
        "mention_everyone": false,
        "mentions": mentions,
        "mention_roles": [],
        "attachments": [],
        "embeds": embeds,
        "pinned": false,
        "type": 0,
    }))
    .expect("Failed to create test message from JSON")
}
