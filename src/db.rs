use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub const USERNAME_CONSTRAINT: &str = "users_username_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Failures of the credential and task stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already taken")]
    EmailTaken,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(USERNAME_CONSTRAINT) => return StoreError::UsernameTaken,
                    Some(EMAIL_CONSTRAINT) => return StoreError::EmailTaken,
                    _ => {}
                }
            }
        }
        StoreError::Database(err)
    }
}

/// Opens the pool. Both waiting for a connection and running a statement are
/// bounded by `timeout_secs`, so a stuck database surfaces as an error.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let statement_timeout_ms = timeout.as_millis();

    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(timeout)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET statement_timeout = {statement_timeout_ms}").as_str())
                    .await?;
                Ok(())
            })
        })
        .connect(&cfg.url)
        .await
        .context("connect to database")
}
