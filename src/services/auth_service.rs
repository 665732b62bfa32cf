//! Domain service for token issuance, verification and revocation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations. Credential failures are
/// not errors here: `validate_credentials` reports them as `Ok(None)`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Token kinds, kept strictly apart so an access token can never stand
/// in for a refresh or reset token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

/// JWT claims carried by every token this service issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringly per JWT convention
    pub sub: String,
    pub username: String,
    pub token_type: TokenKind,
    /// Random token id; present on refresh and reset tokens, absent on
    /// access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
}

/// A fresh token pair plus the public projection of its owner.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Identity attached to a request once its access token checks out.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

/// Domain service trait for token handling.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Issues a short-lived access token for the user.
    async fn generate_access_token(&self, user: &User) -> Result<String, AuthError>;

    /// Checks signature, expiry, issuer/audience and type tag, then
    /// confirms the user still exists.
    ///
    /// # Errors
    ///
    /// Every failure mode is [`AuthError::InvalidToken`]; callers learn
    /// nothing about which check tripped.
    async fn verify_access_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Issues a long-lived refresh token carrying a random token id.
    async fn generate_refresh_token(&self, user: &User) -> Result<String, AuthError>;

    /// Structural checks plus the revocation deny-list, then resolves the
    /// still-existing user.
    async fn verify_refresh_token(&self, token: &str) -> Result<User, AuthError>;

    /// Puts a refresh token's id on the deny-list. Revoking twice is fine.
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError>;

    /// Whether a structurally valid refresh token has been revoked.
    async fn is_refresh_token_revoked(&self, token: &str) -> Result<bool, AuthError>;

    /// Rejects every refresh token the user holds that was issued at or
    /// before this call.
    async fn invalidate_all_user_tokens(&self, user_id: i32) -> Result<(), AuthError>;

    /// Looks up the user and verifies the password.
    ///
    /// Returns `Ok(None)` both for an unknown username and for a wrong
    /// password, so the caller cannot distinguish them.
    async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError>;

    /// Issues a password-reset token with a fixed one-hour lifetime.
    async fn generate_password_reset_token(&self, user: &User) -> Result<String, AuthError>;

    /// Verifies a reset token and resolves its user. Access and refresh
    /// tokens are rejected here regardless of validity.
    async fn verify_password_reset_token(&self, token: &str) -> Result<User, AuthError>;

    /// Builds a complete session: access + refresh token plus the public
    /// user projection. Either both tokens mint or the call fails.
    async fn create_user_session(&self, user: &User) -> Result<SessionResult, AuthError>;

    /// Configured access token lifetime in seconds.
    fn access_token_ttl(&self) -> i64;

    /// Configured refresh token lifetime in seconds.
    fn refresh_token_ttl(&self) -> i64;
}

/// Pulls the bearer token out of an `Authorization` header value.
/// Anything other than exactly `Bearer <token>` yields `None`.
#[must_use]
pub fn extract_token_from_header(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;

    if scheme != "Bearer" || token.is_empty() || parts.next().is_some() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));

        assert_eq!(extract_token_from_header("bearer abc123"), None);
        assert_eq!(extract_token_from_header("Bearer"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
        assert_eq!(extract_token_from_header("Bearer abc 123"), None);
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header(""), None);
    }

    #[test]
    fn test_token_kind_wire_tags() {
        assert_eq!(
            serde_json::to_string(&TokenKind::Access).unwrap(),
            "\"access\""
        );
        assert_eq!(
            serde_json::to_string(&TokenKind::Refresh).unwrap(),
            "\"refresh\""
        );
        assert_eq!(
            serde_json::to_string(&TokenKind::PasswordReset).unwrap(),
            "\"password_reset\""
        );
    }
}
