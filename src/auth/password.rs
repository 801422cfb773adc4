use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::HashingConfig;

#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
}

/// Argon2id hasher with a configurable work factor.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when a login names an unknown user.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cfg: &HashingConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "pixeltasks-dummy-password")?;
        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Salted digest in PHC string format. Two calls never return the same string.
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plain)
    }

    /// Returns false on mismatch and on a hash that cannot be parsed.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification so unknown usernames cost as much as wrong passwords.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        self.verify(plain, &self.dummy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::HashingFailed(e.to_string())
        })?
        .to_string();
    Ok(hash)
}
