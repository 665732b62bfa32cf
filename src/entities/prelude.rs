pub use super::revoked_tokens::Entity as RevokedTokens;
pub use super::users::Entity as Users;
pub use super::watched_items::Entity as WatchedItems;
