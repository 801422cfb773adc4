use tracing::debug;
use uuid::Uuid;

use super::{
    claims::{Claims, TokenKind},
    error::AuthError,
    jwt::JwtKeys,
    repo::{User, UserRepo},
};

/// Decodes the token, checks its kind and subject, and loads the user it names.
pub async fn resolve(
    keys: &JwtKeys,
    users: &dyn UserRepo,
    token: &str,
    expected: TokenKind,
) -> Result<User, AuthError> {
    let claims = keys.decode(token)?;

    if claims.kind != expected {
        return Err(AuthError::WrongTokenType { expected });
    }

    let user_id = subject_id(&claims)?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    debug!(user_id = %user.id, kind = %expected, "identity resolved");
    Ok(user)
}

pub async fn resolve_access(
    keys: &JwtKeys,
    users: &dyn UserRepo,
    token: &str,
) -> Result<User, AuthError> {
    resolve(keys, users, token, TokenKind::Access).await
}

fn subject_id(claims: &Claims) -> Result<Uuid, AuthError> {
    let sub = claims.sub.trim();
    if sub.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Uuid::parse_str(sub).map_err(|_| AuthError::InvalidToken)
}
