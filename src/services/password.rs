//! Password value object.
//!
//! Wraps an Argon2id PHC hash; the plaintext never outlives the call
//! that consumed it. Hashing and verification are CPU-bound, so async
//! callers must wrap them in `spawn_blocking`.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::fmt;

use crate::config::SecurityConfig;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a candidate password against the strength policy. Returns every
/// violated rule so the caller can report them all at once.
#[must_use]
pub fn strength_violations(password: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Password must contain at least one number".to_string());
    }

    violations
}

#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl Password {
    /// Hash a plaintext password with the configured cost params. The
    /// strength policy applies; every violation is reported in one error.
    pub fn from_plain_text(plain: &str, config: &SecurityConfig) -> Result<Self> {
        let violations = strength_violations(plain);
        if !violations.is_empty() {
            anyhow::bail!("{}", violations.join("; "));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = argon2_for(config)?;

        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Wrap a hash loaded from storage, verbatim. No strength check; the
    /// plaintext is long gone.
    pub fn from_hash(hash: &str) -> Result<Self> {
        if hash.is_empty() {
            anyhow::bail!("Password hash must not be empty");
        }

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Verify a plaintext candidate. A malformed hash counts as a failed
    /// verification rather than an error.
    #[must_use]
    pub fn verify(&self, plain: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Whether this hash was produced with weaker cost params than the
    /// current config, or cannot be parsed at all (fail open toward a
    /// rehash on the next successful login).
    #[must_use]
    pub fn needs_rehash(&self, config: &SecurityConfig) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return true;
        };

        let Ok(params) = Params::try_from(&parsed) else {
            return true;
        };

        params.m_cost() < config.argon2_memory_cost_kib
            || params.t_cost() < config.argon2_time_cost
            || params.p_cost() < config.argon2_parallelism
    }

    /// The PHC string for persistence. Not for logging.
    #[must_use]
    pub fn as_hash(&self) -> &str {
        &self.hash
    }
}

// The hash never shows up in logs or error chains.
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

fn argon2_for(config: &SecurityConfig) -> Result<Argon2<'static>> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}
