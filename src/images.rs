use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Where uploaded images end up. The concrete backing is injected through
/// state so handlers never touch the filesystem directly.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the bytes under `key` and return the public URL path.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
}

/// Filesystem store; files are served back under `/uploads/<key>`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(key);
        tokio::fs::write(&path, &body).await?;
        debug!(key, content_type, bytes = body.len(), "image written");
        Ok(format!("/uploads/{key}"))
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryImageStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryImageStore {
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(format!("/uploads/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_returns_public_path() {
        let store = MemoryImageStore::default();
        let url = store
            .put("profile-1.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/profile-1.png");
        assert_eq!(store.len(), 1);
    }
}
