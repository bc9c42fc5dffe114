//! Platform-neutral outgoing message payloads.
//!
//! Services describe what to post with these types; the Serenity gateway adapter
//! turns them into `CreateMessage`/`EditMessage` builders.

use chrono::{DateTime, Utc};

pub const COLOR_BLUE: u32 = 0x0099FF;
pub const COLOR_GREEN: u32 = 0x00FF00;
pub const COLOR_ORANGE: u32 = 0xFF8C00;
pub const COLOR_RED: u32 = 0xFF0000;

/// Discord rejects embeds whose field values exceed this many characters.
pub const MAX_FIELD_VALUE_LEN: usize = 1024;
/// Discord rejects embeds whose description exceeds this many characters.
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Cuts `text` to at most `max_chars` characters, ending in an ellipsis when cut.
pub fn truncate(mut text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut = text
        .char_indices()
        .nth(max_chars.saturating_sub(1))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    text.truncate(cut);
    text.push('…');
    text
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// An embed-style notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<NoticeField>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Notice {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate(description.into(), MAX_DESCRIPTION_LEN));
        self
    }

    /// Adds a field, cutting the value to Discord's field limit.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(NoticeField {
            name: name.into(),
            value: truncate(value.into(), MAX_FIELD_VALUE_LEN),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Value of the first field named `name`.
    #[cfg(test)]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub kind: ButtonKind,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, kind: ButtonKind) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            kind,
        }
    }
}

/// Multi-select string menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    /// `(label, value)` pairs.
    pub options: Vec<(String, String)>,
}

/// One action row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Buttons(Vec<Button>),
    Select(SelectMenu),
}

/// Full outgoing message: optional text, optional notice and interactive rows.
///
/// When editing, an empty `components` list strips any existing rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub notice: Option<Notice>,
    pub components: Vec<Component>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate("Pong!".to_string(), 10), "Pong!");
    }

    /// Tests cutting multi-byte text.
    ///
    /// Expected: exactly the limit in characters, ending in an ellipsis
    #[test]
    fn cuts_on_char_boundaries() {
        let cut = truncate("é".repeat(2500), 2000);

        assert_eq!(cut.chars().count(), 2000);
        assert!(cut.ends_with('…'));
    }

    /// Tests that oversized field values and descriptions are capped.
    ///
    /// Expected: field value at 1024 characters, description at 4096
    #[test]
    fn caps_field_and_description() {
        let notice = Notice::new("Message Deleted", COLOR_RED)
            .description("d".repeat(5000))
            .field("Message", "m".repeat(1500), false);

        assert_eq!(notice.fields[0].value.chars().count(), MAX_FIELD_VALUE_LEN);
        assert_eq!(
            notice.description.as_deref().map(|d| d.chars().count()),
            Some(MAX_DESCRIPTION_LEN)
        );
    }
}
