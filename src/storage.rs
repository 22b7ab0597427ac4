use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Destination for uploaded profile images. The store decides the final
/// reference; callers persist whatever it returns.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `data` and return the public reference for it.
    async fn save(&self, original_name: &str, data: Bytes) -> Result<String, String>;
}

/// Writes images under a local directory, served back at `/uploads`.
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, original_name: &str, data: Bytes) -> Result<String, String> {
        let filename = format!("{}.{}", Uuid::now_v7(), sanitize_extension(original_name));
        let path = self.root.join(&filename);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("Failed to create upload directory: {e}"))?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;

        Ok(format!("/uploads/{filename}"))
    }
}

/// Extension taken from the client-supplied filename, restricted to short
/// alphanumeric suffixes. Anything else becomes `bin`.
fn sanitize_extension(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}
