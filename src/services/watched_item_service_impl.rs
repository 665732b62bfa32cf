//! `SeaORM` implementation of the `WatchedItemService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, WatchedItem, WatchedItemInput};
use crate::services::watched_item_service::{
    WatchedItemError, WatchedItemService, validate_input,
};

pub struct SeaOrmWatchedItemService {
    store: Store,
}

impl SeaOrmWatchedItemService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WatchedItemService for SeaOrmWatchedItemService {
    async fn add(
        &self,
        user_id: i32,
        input: WatchedItemInput,
    ) -> Result<WatchedItem, WatchedItemError> {
        validate_input(&input)?;

        // The unique index decides duplicates, so two concurrent adds of
        // the same media id cannot both succeed.
        let Some(item) = self.store.add_watched_item(user_id, &input).await? else {
            return Err(WatchedItemError::Duplicate);
        };

        info!(user_id, item_id = item.id, "Added watched item");

        Ok(item)
    }

    async fn update(
        &self,
        user_id: i32,
        id: i32,
        input: WatchedItemInput,
    ) -> Result<WatchedItem, WatchedItemError> {
        validate_input(&input)?;

        let existing = self
            .store
            .get_watched_item(id)
            .await?
            .ok_or(WatchedItemError::NotFound)?;

        if existing.user_id != user_id {
            return Err(WatchedItemError::Forbidden);
        }

        // A concurrent delete between the check and the write surfaces as
        // NotFound, same as if the row never existed.
        self.store
            .update_watched_item(id, &input)
            .await?
            .ok_or(WatchedItemError::NotFound)
    }

    async fn delete(&self, user_id: i32, id: i32) -> Result<(), WatchedItemError> {
        let removed = self.store.remove_watched_item(id, user_id).await?;

        if !removed {
            return Err(WatchedItemError::NotFound);
        }

        info!(user_id, item_id = id, "Removed watched item");

        Ok(())
    }

    async fn list_for_user(&self, user_id: i32) -> Result<Vec<WatchedItem>, WatchedItemError> {
        Ok(self.store.list_watched_items(user_id).await?)
    }
}
