use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Task;

pub const IMAGE_PATH_MAX: usize = 255;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub image_path: String,
}

#[derive(Debug, Serialize)]
pub struct TaskRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub status: String,
    pub result_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Task> for TaskRead {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            image_path: t.image_path,
            status: t.status,
            result_path: t.result_path,
            created_at: t.created_at,
        }
    }
}
