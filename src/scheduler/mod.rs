pub mod deferred;
pub mod member_count;
