use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;
pub use repositories::watched_item::{WatchedItem, WatchedItemInput};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn watched_repo(&self) -> repositories::watched_item::WatchedItemRepository {
        repositories::watched_item::WatchedItemRepository::new(self.conn.clone())
    }

    fn revoked_repo(&self) -> repositories::revoked_token::RevokedTokenRepository {
        repositories::revoked_token::RevokedTokenRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Returns `None` when the username is already taken.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        self.user_repo().create(username, password_hash).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_username_with_password(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn update_user_password_hash(&self, id: i32, new_hash: &str) -> Result<()> {
        self.user_repo().update_password_hash(id, new_hash).await
    }

    // ========================================================================
    // Watched items
    // ========================================================================

    /// Returns `None` when the user already tracks this media id.
    pub async fn add_watched_item(
        &self,
        user_id: i32,
        input: &WatchedItemInput,
    ) -> Result<Option<WatchedItem>> {
        self.watched_repo().add(user_id, input).await
    }

    pub async fn get_watched_item(&self, id: i32) -> Result<Option<WatchedItem>> {
        self.watched_repo().get(id).await
    }

    pub async fn list_watched_items(&self, user_id: i32) -> Result<Vec<WatchedItem>> {
        self.watched_repo().list_for_user(user_id).await
    }

    pub async fn update_watched_item(
        &self,
        id: i32,
        input: &WatchedItemInput,
    ) -> Result<Option<WatchedItem>> {
        self.watched_repo().update(id, input).await
    }

    pub async fn remove_watched_item(&self, id: i32, user_id: i32) -> Result<bool> {
        self.watched_repo().remove(id, user_id).await
    }

    // ========================================================================
    // Token revocation
    // ========================================================================

    pub async fn revoke_token(&self, token_id: &str, user_id: i32, expires_at: i64) -> Result<()> {
        self.revoked_repo().revoke(token_id, user_id, expires_at).await
    }

    pub async fn is_token_revoked(&self, token_id: &str) -> Result<bool> {
        self.revoked_repo().is_revoked(token_id).await
    }

    pub async fn set_user_token_cutoff(
        &self,
        user_id: i32,
        revoked_at: i64,
        expires_at: i64,
    ) -> Result<()> {
        self.revoked_repo()
            .set_user_cutoff(user_id, revoked_at, expires_at)
            .await
    }

    pub async fn user_token_cutoff(&self, user_id: i32) -> Result<Option<i64>> {
        self.revoked_repo().user_cutoff(user_id).await
    }

    pub async fn purge_expired_revocations(&self) -> Result<u64> {
        self.revoked_repo()
            .purge_expired(chrono::Utc::now().timestamp())
            .await
    }
}
