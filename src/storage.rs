//! Image storage backends for the upload endpoint.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;

use crate::config::UploadBackend;
use crate::error::UploadError;

/// Logical folder every uploaded image is stored under.
pub const UPLOAD_FOLDER: &str = "portfolio";

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` at `path` (relative, e.g. `portfolio/123-abc.png`) and
    /// return the public URL. Never overwrites an existing object.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, UploadError>;
}

pub fn from_config(backend: &UploadBackend) -> Arc<dyn ImageStore> {
    match backend {
        UploadBackend::Local { dir, public_base } => {
            Arc::new(LocalImageStore::new(dir.clone(), public_base.clone()))
        }
        UploadBackend::Supabase {
            url,
            service_key,
            bucket,
        } => Arc::new(SupabaseImageStore::new(
            url.clone(),
            service_key.clone(),
            bucket.clone(),
        )),
    }
}

// ============================================================================
// Local disk
// ============================================================================

/// Writes under `root`; the app serves `root` at `public_base`.
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    pub fn new(root: PathBuf, public_base: String) -> Self {
        Self { root, public_base }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, UploadError> {
        let file_path = self.root.join(path);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // create_new: an existing file is an error, never overwritten.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &bytes).await?;

        Ok(format!("{}/{}", self.public_base, path))
    }
}

// ============================================================================
// Supabase storage
// ============================================================================

pub struct SupabaseImageStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseImageStore {
    pub fn new(base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            service_key,
            bucket,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ImageStore for SupabaseImageStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path = %path, status = %status, "storage upstream rejected upload");
            return Err(UploadError::Rejected(status.as_u16()));
        }

        Ok(self.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "brochure-storage-{}-{}",
            name,
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn test_local_store_writes_and_returns_public_url() {
        let root = temp_root("write");
        tokio::fs::remove_dir_all(&root).await.ok();
        let store = LocalImageStore::new(root.clone(), "/uploads".to_string());

        let url = store
            .put("portfolio/1-abc.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(url, "/uploads/portfolio/1-abc.png");
        let written = tokio::fs::read(root.join("portfolio/1-abc.png")).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);
        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_local_store_does_not_overwrite() {
        let root = temp_root("overwrite");
        tokio::fs::remove_dir_all(&root).await.ok();
        let store = LocalImageStore::new(root.clone(), "/uploads".to_string());

        store.put("portfolio/same.png", vec![1], "image/png").await.unwrap();
        let second = store.put("portfolio/same.png", vec![2], "image/png").await;

        assert!(matches!(second, Err(UploadError::Io(_))));
        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[test]
    fn test_supabase_public_url() {
        let store = SupabaseImageStore::new(
            "https://proj.supabase.co".to_string(),
            "key".to_string(),
            "portfolio-images".to_string(),
        );
        assert_eq!(
            store.public_url("portfolio/1-a.jpg"),
            "https://proj.supabase.co/storage/v1/object/public/portfolio-images/portfolio/1-a.jpg"
        );
    }
}
