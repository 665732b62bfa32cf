//! Account commands: register, login, refresh, logout.

use std::sync::Arc;

use thiserror::Error;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::services::auth_service::{AuthError, AuthService, SessionResult, UserInfo};
use crate::services::password;

const USERNAME_MIN_LENGTH: usize = 3;
const USERNAME_MAX_LENGTH: usize = 30;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Username already taken")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for UserServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => Self::InvalidToken,
            AuthError::Database(msg) => Self::Database(msg),
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for UserServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Usernames are 3-30 characters from [A-Za-z0-9_].
#[must_use]
pub fn username_violation(username: &str) -> Option<String> {
    let length = username.chars().count();

    if length < USERNAME_MIN_LENGTH || length > USERNAME_MAX_LENGTH {
        return Some(format!(
            "Username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(
            "Username may only contain letters, numbers and underscores".to_string(),
        );
    }

    None
}

pub struct UserService {
    store: Store,
    auth: Arc<dyn AuthService>,
    security: SecurityConfig,
}

impl UserService {
    #[must_use]
    pub fn new(store: Store, auth: Arc<dyn AuthService>, security: SecurityConfig) -> Self {
        Self {
            store,
            auth,
            security,
        }
    }

    /// Create an account. All policy violations are reported together in
    /// one validation error.
    pub async fn register(
        &self,
        username: &str,
        password_input: &str,
    ) -> Result<UserInfo, UserServiceError> {
        let mut violations = Vec::new();
        if let Some(v) = username_violation(username) {
            violations.push(v);
        }
        violations.extend(password::strength_violations(password_input));

        if !violations.is_empty() {
            return Err(UserServiceError::Validation(violations.join("; ")));
        }

        // Pre-check for a friendly error; the unique index still decides
        // the race between concurrent registrations.
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(UserServiceError::UserAlreadyExists);
        }

        let candidate = password_input.to_string();
        let security = self.security.clone();
        let password =
            task::spawn_blocking(move || password::Password::from_plain_text(&candidate, &security))
                .await
                .map_err(|e| {
                    UserServiceError::Internal(format!("Password hashing task panicked: {e}"))
                })??;

        let Some(user) = self
            .store
            .create_user(username, password.as_hash())
            .await?
        else {
            return Err(UserServiceError::UserAlreadyExists);
        };

        info!(user_id = user.id, "Registered new user");

        Ok(user.into())
    }

    /// Verify credentials and open a session. Unknown username and wrong
    /// password produce the same error.
    pub async fn login(
        &self,
        username: &str,
        password_input: &str,
    ) -> Result<SessionResult, UserServiceError> {
        let user = self
            .auth
            .validate_credentials(username, password_input)
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let session = self.auth.create_user_session(&user).await?;

        info!(user_id = user.id, "User logged in");

        Ok(session)
    }

    /// Exchange a valid refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, UserServiceError> {
        let user = self.auth.verify_refresh_token(refresh_token).await?;
        let token = self.auth.generate_access_token(&user).await?;

        Ok(token)
    }

    /// Revoke the presented refresh token. Logout is idempotent: a token
    /// that is already invalid or revoked still logs out cleanly.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), UserServiceError> {
        match self.auth.revoke_refresh_token(refresh_token).await {
            Ok(()) | Err(AuthError::InvalidToken) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_violations() {
        assert!(username_violation("alice").is_none());
        assert!(username_violation("a_1").is_none());
        assert!(username_violation("A".repeat(30).as_str()).is_none());

        assert!(username_violation("ab").is_some());
        assert!(username_violation(&"a".repeat(31)).is_some());
        assert!(username_violation("has space").is_some());
        assert!(username_violation("dash-ed").is_some());
        assert!(username_violation("").is_some());
    }
}
