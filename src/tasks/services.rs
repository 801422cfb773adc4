use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::Task;
use crate::{state::AppState, storage::upload_key};

pub struct UploadItem {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Writes the image to storage and records a `pending` task pointing at it.
/// The stored file is removed again when the task cannot be recorded.
pub async fn create_task_from_upload(
    st: &AppState,
    user_id: Uuid,
    upload: UploadItem,
) -> anyhow::Result<Task> {
    let key = upload_key(
        Uuid::new_v4(),
        upload.filename.as_deref(),
        upload.content_type.as_deref(),
    );
    let size = upload.body.len();
    let path = st
        .storage
        .put_object(&key, upload.body)
        .await
        .with_context(|| format!("store upload {key}"))?;

    let task = match st.tasks.create(user_id, &path).await {
        Ok(task) => task,
        Err(err) => {
            if let Err(cleanup) = st.storage.delete_object(&path).await {
                warn!(error = ?cleanup, path = %path, "orphaned upload left on disk");
            }
            return Err(err);
        }
    };
    info!(task_id = %task.id, %user_id, size, path = %path, "upload stored");
    Ok(task)
}

/// Reads the result file of a task. `None` covers a blank path and a missing file.
pub async fn load_result(st: &AppState, task: &Task) -> anyhow::Result<Option<(String, Bytes)>> {
    let Some(path) = task
        .result_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    else {
        return Ok(None);
    };

    let Some(data) = st.storage.get_object(path).await? else {
        return Ok(None);
    };
    Ok(Some((attachment_name(path), data)))
}

fn attachment_name(path: &str) -> String {
    let name: String = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("result")
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    if name.is_empty() {
        "result".into()
    } else {
        name
    }
}
