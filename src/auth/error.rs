use thiserror::Error;

use super::claims::TokenKind;
use crate::db::StoreError;

/// Why a credential or token was not accepted. The HTTP layer collapses every
/// variant except `LifetimeOutOfRange`, `Encoding` and `Store` into one 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token signing secret is not configured")]
    Unconfigured,
    #[error("token is invalid")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
    #[error("expected a {expected} token")]
    WrongTokenType { expected: TokenKind },
    #[error("token subject does not exist")]
    UserNotFound,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("token lifetime is out of range")]
    LifetimeOutOfRange,
    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
