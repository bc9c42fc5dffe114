use thiserror::Error;

/// Internal issues with the codebase indicating unexpected behavior & possible bugs
#[derive(Error, Debug)]
pub enum InternalError {
    /// Failure to parse a component custom id we are expected to have produced
    ///
    /// Occurs when a button or select menu carries an id that does not match any
    /// known layout, e.g. a card posted by an older build of the bot.
    #[error("Failed to parse custom id '{value}': {reason}")]
    ParseCustomId {
        /// The custom id that failed to parse
        value: String,
        /// The reason for the parse failure
        reason: String,
    },

    /// Failure to convert Unix timestamp to Discord timestamp
    ///
    /// Occurs when a valid Unix timestamp cannot be converted to Discord's
    /// timestamp format, typically due to timestamp being out of range.
    #[error("Failed to convert Unix timestamp {timestamp} to Discord timestamp: {reason}")]
    InvalidDiscordTimestamp {
        /// The Unix timestamp that failed to convert
        timestamp: i64,
        /// The reason for conversion failure
        reason: String,
    },
}
