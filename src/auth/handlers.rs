use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{instrument, warn, Span};

use super::{
    dto::{LoginForm, RefreshRequest, RegisterRequest, TokenResponse, UserRead},
    extractors::AuthUser,
    services,
};
use crate::{error::ApiError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRead>), ApiError> {
    let Json(payload) = payload?;
    let registration = payload.validate().map_err(|e| {
        warn!(error = %e, "registration rejected");
        ApiError::from(e)
    })?;
    let user = services::register(&state, registration).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form), fields(username))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form?;
    Span::current().record("username", form.username.as_str());
    let pair = services::login(&state, &form.username, &form.password).await?;
    Ok(Json(pair.into()))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;
    let pair = services::refresh(&state, &payload.refresh_token).await?;
    Ok(Json(pair.into()))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserRead> {
    Json(user.into())
}
