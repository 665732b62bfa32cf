//! Domain service for the per-user watchlist.

use thiserror::Error;

use crate::db::{WatchedItem, WatchedItemInput};

pub const MEDIA_TYPES: [&str; 3] = ["movie", "series", "book"];

#[derive(Debug, Error)]
pub enum WatchedItemError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Item already in watchlist")]
    Duplicate,

    #[error("Watched item not found")]
    NotFound,

    #[error("Item belongs to another user")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for WatchedItemError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for WatchedItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for watchlist CRUD.
#[async_trait::async_trait]
pub trait WatchedItemService: Send + Sync {
    /// Adds an item for the user.
    ///
    /// # Errors
    ///
    /// Returns [`WatchedItemError::Duplicate`] when the user already
    /// tracks this media id.
    async fn add(
        &self,
        user_id: i32,
        input: WatchedItemInput,
    ) -> Result<WatchedItem, WatchedItemError>;

    /// Overwrites every caller-editable field of an item.
    ///
    /// # Errors
    ///
    /// Returns [`WatchedItemError::NotFound`] for a missing id and
    /// [`WatchedItemError::Forbidden`] when the item belongs to someone
    /// else.
    async fn update(
        &self,
        user_id: i32,
        id: i32,
        input: WatchedItemInput,
    ) -> Result<WatchedItem, WatchedItemError>;

    /// Removes an item, scoped to its owner.
    async fn delete(&self, user_id: i32, id: i32) -> Result<(), WatchedItemError>;

    /// All items tracked by the given user.
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<WatchedItem>, WatchedItemError>;
}

/// Reject payloads before they reach the database.
pub fn validate_input(input: &WatchedItemInput) -> Result<(), WatchedItemError> {
    let mut violations = Vec::new();

    if !MEDIA_TYPES.contains(&input.media_type.as_str()) {
        violations.push(format!(
            "media_type must be one of: {}",
            MEDIA_TYPES.join(", ")
        ));
    }
    if input.media_id.trim().is_empty() {
        violations.push("media_id must not be empty".to_string());
    }
    if input.title.trim().is_empty() {
        violations.push("title must not be empty".to_string());
    }
    if input.status.trim().is_empty() {
        violations.push("status must not be empty".to_string());
    }
    if input.current_episode < 0 {
        violations.push("current_episode must not be negative".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(WatchedItemError::Validation(violations.join("; ")))
    }
}
