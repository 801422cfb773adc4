use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Stores `body` under `key` and returns the path recorded on the task.
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<String>;
    /// Reads a previously recorded path. `Ok(None)` when the file is gone.
    async fn get_object(&self, path: &str) -> anyhow::Result<Option<Bytes>>;
    /// Removes a recorded path. A path that is already gone is not an error.
    async fn delete_object(&self, path: &str) -> anyhow::Result<()>;
}

/// Files under a directory on local disk.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<String> {
        anyhow::ensure!(
            !key.is_empty() && !key.contains(['/', '\\']) && !key.starts_with('.'),
            "invalid storage key {key:?}"
        );
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get_object(&self, path: &str) -> anyhow::Result<Option<Bytes>> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {path}")),
        }
    }

    async fn delete_object(&self, path: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {path}")),
        }
    }
}

/// Storage key for an upload: a fresh UUID plus an extension taken from the
/// client filename, or from the content type when the filename has none.
pub fn upload_key(id: uuid::Uuid, filename: Option<&str>, content_type: Option<&str>) -> String {
    let ext = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .or_else(|| content_type.and_then(ext_from_mime).map(str::to_string));

    match ext {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
