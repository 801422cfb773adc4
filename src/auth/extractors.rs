use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use super::{identity, repo::User};
use crate::{error::ApiError, state::AppState};

/// The authenticated caller. Handlers that take this argument only run when
/// the request carried a valid access token for an existing user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            debug!("missing or malformed Authorization header");
            return Err(ApiError::Unauthorized);
        };

        let user = identity::resolve_access(&state.jwt, state.users.as_ref(), token).await?;
        Ok(AuthUser(user))
    }
}

/// Credential of an `Authorization: Bearer <token>` header. The scheme is
/// case-insensitive; an empty credential counts as absent.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
