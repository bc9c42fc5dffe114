//! Domain models shared by the service and data layers.
//!
//! Models are converted from Serenity types at the bot boundary and turned back into
//! Serenity builders only inside the gateway adapter, so the service layer can be
//! exercised without a live Discord connection.

pub mod approval;
pub mod audit;
pub mod member;
pub mod message;
pub mod notice;
pub mod role;

/// Parses a Discord snowflake, rejecting zero (Serenity ids cannot hold it).
pub fn parse_snowflake(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(parse_snowflake(" 123 "), Some(123));
        assert_eq!(parse_snowflake("0"), None);
        assert_eq!(parse_snowflake("abc"), None);
    }
}
