//! Disk storage for uploaded profile pictures.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};

/// Longest file extension kept from the client-supplied filename.
const MAX_EXTENSION_LEN: usize = 10;

/// A file written to the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Generated name of the file inside the uploads directory
    pub filename: String,
    /// Public path the file is served under, e.g. `/uploads/<filename>`
    pub url: String,
    /// Location on disk
    pub path: PathBuf,
}

/// Writes uploads to a directory and builds their public URLs.
///
/// Filenames are generated, never taken from the client, so uploads cannot
/// escape the directory or overwrite each other.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    directory: PathBuf,
    public_path: String,
    max_file_size: usize,
}

impl UploadStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            public_path: config.public_path.trim_end_matches('/').to_string(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Route prefix the uploads directory is served under.
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Persists `data` under a generated filename.
    ///
    /// # Errors
    /// - `AppError::BadRequest` if `data` is empty or exceeds the size limit
    /// - `AppError::Internal` if the directory or file cannot be written
    pub async fn save(&self, original_name: Option<&str>, data: &[u8]) -> AppResult<StoredUpload> {
        if data.is_empty() {
            return Err(AppError::bad_request("No file uploaded."));
        }
        if data.len() > self.max_file_size {
            return Err(self.too_large());
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    directory = %self.directory.display(),
                    "Failed to create uploads directory"
                )
            })?;

        let filename = generate_filename(original_name);
        let path = self.directory.join(&filename);
        tokio::fs::write(&path, data).await.inspect_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to write upload")
        })?;

        tracing::debug!(
            filename = %filename,
            size = data.len(),
            "Stored upload"
        );

        Ok(StoredUpload {
            url: self.url_for(&filename),
            filename,
            path,
        })
    }

    /// Rejection for uploads over the size limit.
    pub fn too_large(&self) -> AppError {
        AppError::bad_request(format!(
            "File too large (limit is {} bytes)",
            self.max_file_size
        ))
    }

    /// Deletes a stored upload. Failures are logged, not returned.
    pub async fn remove(&self, upload: &StoredUpload) {
        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            tracing::warn!(
                error = %e,
                path = %upload.path.display(),
                "Failed to remove orphaned upload"
            );
        }
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.public_path, filename)
    }
}

/// `<unix millis>-<uuid>[.<ext>]`, keeping a sanitized extension from the
/// original name.
fn generate_filename(original_name: Option<&str>) -> String {
    let stem = format!("{}-{}", Timestamp::now().as_millisecond(), Uuid::new_v4().simple());
    match original_name.and_then(sanitized_extension) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir, max_file_size: usize) -> UploadStorage {
        UploadStorage::new(&UploadConfig {
            directory: dir.path().join("uploads").to_string_lossy().into_owned(),
            public_path: "/uploads/".to_string(),
            max_file_size,
        })
    }

    #[test]
    fn test_sanitized_extension() {
        assert_eq!(sanitized_extension("avatar.PNG"), Some("png".to_string()));
        assert_eq!(sanitized_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("weird.p$g"), None);
        assert_eq!(sanitized_extension("long.abcdefghijk"), None);
    }

    #[test]
    fn test_generated_filenames_are_unique() {
        let a = generate_filename(Some("a.jpg"));
        let b = generate_filename(Some("a.jpg"));
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(!generate_filename(Some("../../etc/passwd")).contains('/'));
    }

    #[tokio::test]
    async fn test_save_writes_file_and_builds_url() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir, 1024);

        let stored = storage.save(Some("me.png"), b"png-bytes").await.unwrap();

        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"png-bytes");
        assert!(stored.path.starts_with(storage.directory()));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir, 1024);
        let err = storage.save(Some("me.png"), b"").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir, 4);
        let err = storage.save(Some("me.png"), b"too big").await.unwrap_err();
        match err {
            AppError::BadRequest { message } => assert!(message.contains("too large")),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir, 1024);
        let stored = storage.save(None, b"data").await.unwrap();
        assert!(stored.path.exists());

        storage.remove(&stored).await;
        assert!(!stored.path.exists());

        // Removing twice only logs.
        storage.remove(&stored).await;
    }
}
