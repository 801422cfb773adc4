use thiserror::Error;
use tracing::{error, info, warn};

use super::{
    claims::TokenKind,
    dto::Registration,
    error::AuthError,
    identity,
    jwt::TokenPair,
    password::PasswordError,
    repo::{NewUser, User},
};
use crate::{db::StoreError, error::ApiError, state::AppState};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] PasswordError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Hashing(e) => e.into(),
            RegisterError::Join(e) => anyhow::Error::from(e).into(),
            RegisterError::Store(e) => e.into(),
        }
    }
}

/// Creates the user. Username is checked before email, so a request that
/// collides on both reports the username. The lookups are only a pre-check:
/// the insert itself is what decides a race between two registrations.
pub async fn register(st: &AppState, reg: Registration) -> Result<User, RegisterError> {
    if st.users.find_by_username(&reg.username).await?.is_some() {
        warn!(username = %reg.username, "username already registered");
        return Err(StoreError::UsernameTaken.into());
    }
    if st.users.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(StoreError::EmailTaken.into());
    }

    let hasher = st.hasher.clone();
    let password = reg.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    let user = st
        .users
        .insert(NewUser {
            username: reg.username,
            full_name: reg.full_name,
            email: reg.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials and issues an access/refresh pair. Unknown usernames and
/// wrong passwords fail the same way.
pub async fn login(st: &AppState, username: &str, password: &str) -> Result<TokenPair, AuthError> {
    let user = st.users.find_by_username(username).await?;

    let hasher = st.hasher.clone();
    let password = password.to_string();
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let ok = match tokio::task::spawn_blocking(move || match stored {
        Some(hash) => hasher.verify(&password, &hash),
        None => hasher.verify_dummy(&password),
    })
    .await
    {
        Ok(ok) => ok,
        Err(e) => {
            error!(error = %e, "password verification task failed");
            false
        }
    };

    let user = match user {
        Some(u) if ok => u,
        _ => {
            warn!(username = %username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let pair = st.jwt.issue_pair(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(pair)
}

/// Exchanges a refresh token for a new pair. The subject must still exist.
pub async fn refresh(st: &AppState, refresh_token: &str) -> Result<TokenPair, AuthError> {
    let user = identity::resolve(
        &st.jwt,
        st.users.as_ref(),
        refresh_token,
        TokenKind::Refresh,
    )
    .await?;
    let pair = st.jwt.issue_pair(user.id)?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(pair)
}
