use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entities::{prelude::*, revoked_tokens};

pub struct RevokedTokenRepository {
    conn: DatabaseConnection,
}

impl RevokedTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Record a token id on the deny-list. Revoking twice is a no-op.
    pub async fn revoke(&self, token_id: &str, user_id: i32, expires_at: i64) -> Result<()> {
        let active = revoked_tokens::ActiveModel {
            token_id: Set(token_id.to_string()),
            user_id: Set(user_id),
            revoked_at: Set(chrono::Utc::now().timestamp()),
            expires_at: Set(expires_at),
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Ok(());
                }
                Err(err).context("Failed to record revoked token")
            }
        }
    }

    pub async fn is_revoked(&self, token_id: &str) -> Result<bool> {
        let row = RevokedTokens::find_by_id(token_id)
            .one(&self.conn)
            .await
            .context("Failed to query revoked token")?;

        Ok(row.is_some())
    }

    /// Set or refresh the per-user cutoff marker. Refresh tokens issued
    /// at or before `revoked_at` are rejected wholesale.
    pub async fn set_user_cutoff(
        &self,
        user_id: i32,
        revoked_at: i64,
        expires_at: i64,
    ) -> Result<()> {
        let marker_id = format!("user:{user_id}");

        let existing = RevokedTokens::find_by_id(&marker_id)
            .one(&self.conn)
            .await
            .context("Failed to query user cutoff marker")?;

        if let Some(model) = existing {
            let mut active: revoked_tokens::ActiveModel = model.into();
            active.revoked_at = Set(revoked_at);
            active.expires_at = Set(expires_at);
            active
                .update(&self.conn)
                .await
                .context("Failed to update user cutoff marker")?;
            return Ok(());
        }

        let active = revoked_tokens::ActiveModel {
            token_id: Set(marker_id),
            user_id: Set(user_id),
            revoked_at: Set(revoked_at),
            expires_at: Set(expires_at),
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Ok(());
                }
                Err(err).context("Failed to insert user cutoff marker")
            }
        }
    }

    /// The user's cutoff instant, if one has been set.
    pub async fn user_cutoff(&self, user_id: i32) -> Result<Option<i64>> {
        let marker_id = format!("user:{user_id}");

        let row = RevokedTokens::find_by_id(&marker_id)
            .one(&self.conn)
            .await
            .context("Failed to query user cutoff marker")?;

        Ok(row.map(|m| m.revoked_at))
    }

    /// Drop deny-list rows whose token already expired on its own.
    pub async fn purge_expired(&self, now: i64) -> Result<u64> {
        let result = RevokedTokens::delete_many()
            .filter(revoked_tokens::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired revocations")?;

        Ok(result.rows_affected)
    }
}
