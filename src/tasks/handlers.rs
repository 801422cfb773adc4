use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, TaskRead, IMAGE_PATH_MAX},
    services::{create_task_from_upload, load_result, UploadItem},
};
use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState};

pub fn task_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/upload",
            post(upload_task).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/download", get(download_result))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<TaskRead>>, ApiError> {
    let tasks = state.tasks.list_by_user(user.id).await?;
    Ok(Json(tasks.into_iter().map(TaskRead::from).collect()))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskRead>), ApiError> {
    let Json(body) = body?;
    let image_path = body.image_path.trim();
    if image_path.is_empty() {
        return Err(ApiError::Validation("image_path must not be empty".into()));
    }
    if image_path.chars().count() > IMAGE_PATH_MAX {
        return Err(ApiError::Validation(format!(
            "image_path must be at most {IMAGE_PATH_MAX} characters"
        )));
    }

    let task = state.tasks.create(user.id, image_path).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// POST /tasks/upload, multipart field `file`.
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<TaskRead>), ApiError> {
    let mut mp = mp?;
    let mut upload = None;
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "bad multipart body");
        ApiError::Validation("Malformed multipart body".into())
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field
            .bytes()
            .await
            .map_err(|e| {
                warn!(error = %e, "multipart file field unreadable");
                ApiError::Validation("Malformed multipart body".into())
            })?;
        upload = Some(UploadItem {
            filename,
            content_type,
            body,
        });
        break;
    }
    let upload = upload.ok_or_else(|| ApiError::Validation("file is required".into()))?;

    let task = create_task_from_upload(&state, user.id, upload).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state, user, id), fields(user_id = %user.id))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TaskRead>, ApiError> {
    let Path(id) = id?;
    state
        .tasks
        .get_for_user(user.id, id)
        .await?
        .map(|t| Json(t.into()))
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))
}

#[instrument(skip(state, user, id), fields(user_id = %user.id))]
pub async fn download_result(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let not_found = || ApiError::NotFound("Result file not found".into());

    let task = state
        .tasks
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(not_found)?;
    let (filename, data) = load_result(&state, &task).await?.ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    ))
}
