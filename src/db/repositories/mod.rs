pub mod revoked_token;
pub mod user;
pub mod watched_item;
