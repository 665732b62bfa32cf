//! JWT-backed implementation of the `AuthService` trait.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tokio::task;
use tracing::warn;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{Store, User};
use crate::services::auth_service::{
    AuthError, AuthService, AuthenticatedUser, Claims, SessionResult, SessionUser, TokenKind,
};
use crate::services::password::Password;

const ISSUER: &str = "trackarr-api";
const AUDIENCE: &str = "trackarr-client";

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 3600;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 604_800;
const RESET_TTL_SECONDS: i64 = 3600;

const TOKEN_ID_LENGTH: usize = 32;

pub struct JwtAuthService {
    store: Store,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
    security: SecurityConfig,
}

impl JwtAuthService {
    #[must_use]
    pub fn new(store: Store, auth: &AuthConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            access_ttl: parse_ttl_seconds(&auth.access_token_ttl, DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: parse_ttl_seconds(&auth.refresh_token_ttl, DEFAULT_REFRESH_TTL_SECONDS),
            security,
        }
    }

    fn mint(
        &self,
        user: &User,
        kind: TokenKind,
        ttl: i64,
        jti: Option<String>,
    ) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            token_type: kind,
            jti,
            iat: now,
            exp: now + ttl,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }

    /// Tokens only stay good while their user exists.
    async fn resolve_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let id: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        self.store
            .get_user_by_id(id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    async fn check_refresh_revocation(&self, claims: &Claims) -> Result<bool, AuthError> {
        let Some(jti) = claims.jti.as_deref() else {
            return Err(AuthError::InvalidToken);
        };

        if self.store.is_token_revoked(jti).await? {
            return Ok(true);
        }

        // Inclusive: with second-resolution timestamps a token minted in
        // the same second as the revocation must not survive it
        let user_id: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        if let Some(cutoff) = self.store.user_token_cutoff(user_id).await?
            && claims.iat <= cutoff
        {
            return Ok(true);
        }

        Ok(false)
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        self.mint(user, TokenKind::Access, self.access_ttl, None)
    }

    async fn verify_access_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.decode(token, TokenKind::Access)?;
        let user = self.resolve_user(&claims).await?;

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
        })
    }

    async fn generate_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        self.mint(
            user,
            TokenKind::Refresh,
            self.refresh_ttl,
            Some(generate_token_id()),
        )
    }

    async fn verify_refresh_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.decode(token, TokenKind::Refresh)?;

        if self.check_refresh_revocation(&claims).await? {
            return Err(AuthError::InvalidToken);
        }

        self.resolve_user(&claims).await
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.decode(token, TokenKind::Refresh)?;
        let jti = claims.jti.ok_or(AuthError::InvalidToken)?;
        let user_id: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        self.store.revoke_token(&jti, user_id, claims.exp).await?;

        // Keep the deny-list from growing without bound
        if let Err(e) = self.store.purge_expired_revocations().await {
            warn!("Failed to purge expired token revocations: {e}");
        }

        Ok(())
    }

    async fn is_refresh_token_revoked(&self, token: &str) -> Result<bool, AuthError> {
        let claims = self.decode(token, TokenKind::Refresh)?;
        self.check_refresh_revocation(&claims).await
    }

    async fn invalidate_all_user_tokens(&self, user_id: i32) -> Result<(), AuthError> {
        let now = chrono::Utc::now().timestamp();
        self.store
            .set_user_token_cutoff(user_id, now, now + self.refresh_ttl)
            .await?;
        Ok(())
    }

    async fn validate_credentials(
        &self,
        username: &str,
        password_input: &str,
    ) -> Result<Option<User>, AuthError> {
        let Some((user, stored_hash)) = self.store.get_user_with_password(username).await? else {
            return Ok(None);
        };

        let Ok(stored) = Password::from_hash(&stored_hash) else {
            return Ok(None);
        };

        let candidate = password_input.to_string();
        let verify_target = stored.clone();

        let is_valid = task::spawn_blocking(move || verify_target.verify(&candidate))
            .await
            .map_err(|e| {
                AuthError::Internal(format!("Password verification task panicked: {e}"))
            })?;

        if !is_valid {
            return Ok(None);
        }

        // Transparently upgrade hashes minted with weaker params. Login
        // already succeeded, so a failure here only gets logged.
        if self.security.auto_migrate_password_hashes && stored.needs_rehash(&self.security) {
            let candidate = password_input.to_string();
            let security = self.security.clone();

            match task::spawn_blocking(move || Password::from_plain_text(&candidate, &security))
                .await
            {
                Ok(Ok(upgraded)) => {
                    if let Err(e) = self
                        .store
                        .update_user_password_hash(user.id, upgraded.as_hash())
                        .await
                    {
                        warn!(user_id = user.id, "Failed to persist upgraded password hash: {e}");
                    }
                }
                Ok(Err(e)) => warn!(user_id = user.id, "Failed to re-hash password: {e}"),
                Err(e) => warn!(user_id = user.id, "Password re-hash task panicked: {e}"),
            }
        }

        Ok(Some(user))
    }

    async fn generate_password_reset_token(&self, user: &User) -> Result<String, AuthError> {
        self.mint(
            user,
            TokenKind::PasswordReset,
            RESET_TTL_SECONDS,
            Some(generate_token_id()),
        )
    }

    async fn verify_password_reset_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.decode(token, TokenKind::PasswordReset)?;
        self.resolve_user(&claims).await
    }

    async fn create_user_session(&self, user: &User) -> Result<SessionResult, AuthError> {
        let access_token = self.mint(user, TokenKind::Access, self.access_ttl, None)?;
        let refresh_token = self.mint(
            user,
            TokenKind::Refresh,
            self.refresh_ttl,
            Some(generate_token_id()),
        )?;

        Ok(SessionResult {
            user: SessionUser {
                id: user.id,
                username: user.username.clone(),
            },
            access_token,
            refresh_token,
            expires_in: self.access_ttl,
        })
    }

    fn access_token_ttl(&self) -> i64 {
        self.access_ttl
    }

    fn refresh_token_ttl(&self) -> i64 {
        self.refresh_ttl
    }
}

/// Random 32-character alphanumeric token id.
fn generate_token_id() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Parse a lifetime expression like "15m", "1h" or "7d" into seconds.
/// Bare digits are taken as seconds. Anything unparseable falls back.
fn parse_ttl_seconds(expr: &str, fallback: i64) -> i64 {
    let expr = expr.trim();

    if expr.is_empty() || !expr.is_ascii() {
        return fallback;
    }

    if expr.chars().all(|c| c.is_ascii_digit()) {
        return expr.parse().unwrap_or(fallback);
    }

    let (digits, unit) = expr.split_at(expr.len() - 1);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return fallback;
    }

    let Ok(value) = digits.parse::<i64>() else {
        return fallback;
    };

    match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        "d" => value * 86_400,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl_units() {
        assert_eq!(parse_ttl_seconds("45s", 0), 45);
        assert_eq!(parse_ttl_seconds("15m", 0), 900);
        assert_eq!(parse_ttl_seconds("1h", 0), 3600);
        assert_eq!(parse_ttl_seconds("7d", 0), 604_800);
        assert_eq!(parse_ttl_seconds("90", 0), 90);
    }

    #[test]
    fn test_parse_ttl_fallbacks() {
        assert_eq!(parse_ttl_seconds("", 3600), 3600);
        assert_eq!(parse_ttl_seconds("1w", 3600), 3600);
        assert_eq!(parse_ttl_seconds("h1", 3600), 3600);
        assert_eq!(parse_ttl_seconds("-5m", 3600), 3600);
        assert_eq!(parse_ttl_seconds("m", 3600), 3600);
        assert_eq!(parse_ttl_seconds("१०s", 3600), 3600);
    }

    #[test]
    fn test_token_id_shape() {
        let id = generate_token_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_ne!(generate_token_id(), generate_token_id());
    }

    async fn service_with_user() -> (JwtAuthService, User) {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        let user = store
            .create_user("mallory", "unused-hash")
            .await
            .unwrap()
            .unwrap();

        let auth = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        };
        let service = JwtAuthService::new(store, &auth, SecurityConfig::default());

        (service, user)
    }

    #[tokio::test]
    async fn test_reset_token_type_isolation() {
        let (service, user) = service_with_user().await;

        let reset = service.generate_password_reset_token(&user).await.unwrap();
        assert!(service.verify_password_reset_token(&reset).await.is_ok());
        assert!(service.verify_access_token(&reset).await.is_err());
        assert!(service.verify_refresh_token(&reset).await.is_err());

        let access = service.generate_access_token(&user).await.unwrap();
        assert!(service.verify_password_reset_token(&access).await.is_err());

        let refresh = service.generate_refresh_token(&user).await.unwrap();
        assert!(service.verify_password_reset_token(&refresh).await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_all_user_tokens() {
        let (service, user) = service_with_user().await;

        let first = service.generate_refresh_token(&user).await.unwrap();
        let second = service.generate_refresh_token(&user).await.unwrap();
        assert!(service.verify_refresh_token(&first).await.is_ok());

        service.invalidate_all_user_tokens(user.id).await.unwrap();

        assert!(service.verify_refresh_token(&first).await.is_err());
        assert!(service.verify_refresh_token(&second).await.is_err());

        // A token minted strictly after the cutoff instant is good again
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let fresh = service.generate_refresh_token(&user).await.unwrap();
        assert!(service.verify_refresh_token(&fresh).await.is_ok());
    }
}
