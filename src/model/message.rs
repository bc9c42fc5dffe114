//! Domain models for chat messages observed by the bot.

use serenity::all::{ChannelId, MessageId, UserId};

/// Location of a message, enough to edit, pin or link it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }

    /// Permalink to the message within `guild_id`.
    pub fn link(&self, guild_id: u64) -> String {
        format!(
            "https://discord.com/channels/{}/{}/{}",
            guild_id, self.channel_id, self.message_id
        )
    }
}

/// Title and fields of an embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSummary {
    pub title: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl EmbedSummary {
    /// Value of the first field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Last-known state of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: UserId,
    pub author_is_bot: bool,
    pub content: String,
    /// Users mentioned in the message.
    pub mentions: Vec<UserId>,
    pub embeds: Vec<EmbedSummary>,
}

impl ChannelMessage {
    pub fn from_serenity(message: &serenity::all::Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author: message.author.id,
            author_is_bot: message.author.bot,
            content: message.content.clone(),
            mentions: message.mentions.iter().map(|user| user.id).collect(),
            embeds: message
                .embeds
                .iter()
                .map(|embed| EmbedSummary {
                    title: embed.title.clone(),
                    fields: embed
                        .fields
                        .iter()
                        .map(|field| (field.name.clone(), field.value.clone()))
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn reference(&self) -> MessageRef {
        MessageRef::new(self.channel_id, self.id)
    }
}
