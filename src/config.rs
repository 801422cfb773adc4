use std::str::FromStr;

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

/// Upper bound for both token lifetimes (ten years).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Argon2id work factor. Existing hashes keep the parameters they were made with.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL is not set")?,
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            timeout_secs: parse(&lookup, "DB_TIMEOUT_SECS", 5)?,
        };

        let secret = lookup("JWT_SECRET").unwrap_or_default();
        if secret.trim().is_empty() {
            bail!("JWT_SECRET is not set; refusing to start without a signing secret");
        }

        let algorithm_name = var("JWT_ALGORITHM", "HS256");
        let algorithm = Algorithm::from_str(&algorithm_name)
            .map_err(|_| anyhow::anyhow!("unknown JWT_ALGORITHM {algorithm_name}"))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("JWT_ALGORITHM {algorithm_name} is not a shared-secret algorithm");
        }

        let jwt = JwtConfig {
            secret,
            algorithm,
            issuer: var("JWT_ISSUER", "pixeltasks"),
            audience: var("JWT_AUDIENCE", "pixeltasks-users"),
            ttl_minutes: parse(&lookup, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24)?,
        };
        for (key, minutes) in [
            ("JWT_TTL_MINUTES", jwt.ttl_minutes),
            ("JWT_REFRESH_TTL_MINUTES", jwt.refresh_ttl_minutes),
        ] {
            if !(0..=MAX_TTL_MINUTES).contains(&minutes) {
                bail!("{key}={minutes} must be between 0 and {MAX_TTL_MINUTES}");
            }
        }

        let hashing = HashingConfig {
            memory_kib: parse(&lookup, "ARGON2_MEMORY_KIB", 19 * 1024)?,
            iterations: parse(&lookup, "ARGON2_ITERATIONS", 2)?,
            parallelism: parse(&lookup, "ARGON2_PARALLELISM", 1)?,
        };

        let storage = StorageConfig {
            upload_dir: var("UPLOAD_DIR", "uploads"),
            max_upload_bytes: parse(&lookup, "UPLOAD_MAX_BYTES", 20 * 1024 * 1024)?,
        };

        Ok(Self {
            host: var("APP_HOST", "0.0.0.0"),
            port: parse(&lookup, "APP_PORT", 8080)?,
            database,
            jwt,
            hashing,
            storage,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw}: {e}")),
        None => Ok(default),
    }
}
