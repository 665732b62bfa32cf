pub mod prelude;

pub mod revoked_tokens;
pub mod users;
pub mod watched_items;
