mod dto;
pub mod handlers;
pub mod repo;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::task_routes(max_upload_bytes)
}
