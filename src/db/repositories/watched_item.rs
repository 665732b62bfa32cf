use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};

use crate::entities::{prelude::*, watched_items};

/// A tracked catalog entry as exposed to the rest of the application
#[derive(Debug, Clone, Serialize)]
pub struct WatchedItem {
    pub id: i32,
    pub user_id: i32,
    pub media_type: String,
    pub media_id: String,
    pub title: String,
    pub poster_path: String,
    pub release_date: String,
    pub status: String,
    pub current_episode: i32,
}

/// Caller-supplied fields for inserts and full-overwrite updates.
/// Everything defaults so missing fields surface as validation errors
/// instead of deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchedItemInput {
    pub media_type: String,
    pub media_id: String,
    pub title: String,
    pub poster_path: String,
    pub release_date: String,
    pub status: String,
    pub current_episode: i32,
}

pub struct WatchedItemRepository {
    conn: DatabaseConnection,
}

impl WatchedItemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: watched_items::Model) -> WatchedItem {
        WatchedItem {
            id: m.id,
            user_id: m.user_id,
            media_type: m.media_type,
            media_id: m.media_id,
            title: m.title,
            poster_path: m.poster_path,
            release_date: m.release_date,
            status: m.status,
            current_episode: m.current_episode,
        }
    }

    /// Insert an item for a user. Returns `None` when the user already
    /// tracks this `media_id` (unique index on `user_id`, `media_id`).
    pub async fn add(&self, user_id: i32, input: &WatchedItemInput) -> Result<Option<WatchedItem>> {
        let active = watched_items::ActiveModel {
            user_id: Set(user_id),
            media_type: Set(input.media_type.clone()),
            media_id: Set(input.media_id.clone()),
            title: Set(input.title.clone()),
            poster_path: Set(input.poster_path.clone()),
            release_date: Set(input.release_date.clone()),
            status: Set(input.status.clone()),
            current_episode: Set(input.current_episode),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(Self::map_model(model))),
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Ok(None);
                }
                Err(err).context("Failed to insert watched item")
            }
        }
    }

    pub async fn get(&self, id: i32) -> Result<Option<WatchedItem>> {
        let result = WatchedItems::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query watched item")?;

        Ok(result.map(Self::map_model))
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<WatchedItem>> {
        let rows = WatchedItems::find()
            .filter(watched_items::Column::UserId.eq(user_id))
            .order_by_asc(watched_items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list watched items")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Full overwrite of every caller-editable field. Returns `None` when the
    /// row no longer exists.
    pub async fn update(&self, id: i32, input: &WatchedItemInput) -> Result<Option<WatchedItem>> {
        let Some(model) = WatchedItems::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query watched item for update")?
        else {
            return Ok(None);
        };

        let mut active: watched_items::ActiveModel = model.into();
        active.media_type = Set(input.media_type.clone());
        active.media_id = Set(input.media_id.clone());
        active.title = Set(input.title.clone());
        active.poster_path = Set(input.poster_path.clone());
        active.release_date = Set(input.release_date.clone());
        active.status = Set(input.status.clone());
        active.current_episode = Set(input.current_episode);

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update watched item")?;

        Ok(Some(Self::map_model(updated)))
    }

    /// Delete scoped to the owning user. Returns whether a row was removed.
    pub async fn remove(&self, id: i32, user_id: i32) -> Result<bool> {
        let result = WatchedItems::delete_many()
            .filter(watched_items::Column::Id.eq(id))
            .filter(watched_items::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete watched item")?;

        Ok(result.rows_affected > 0)
    }
}
