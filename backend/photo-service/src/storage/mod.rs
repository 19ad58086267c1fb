/// Media storage for uploaded post images
///
/// Files are written under the configured media root and identified by a
/// relative reference (`posts/<uuid>_<name>`) that is stored on the image row.
/// Serving the files is left to the web server in front of the service.
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory below the media root that post images are written to
pub const POSTS_DIR: &str = "posts";

const MAX_FILE_NAME_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid media reference: {0}")]
    InvalidReference(String),
}

#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist an uploaded file and return its stored reference
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored file; a missing file is not an error
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// Stores files on the local filesystem under `root`
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create `<root>/posts` if it does not exist yet
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.root.join(POSTS_DIR)).await?;
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if reference.is_empty() || escapes {
            return Err(StorageError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let reference = format!(
            "{}/{}_{}",
            POSTS_DIR,
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        );
        let path = self.resolve(&reference)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(reference = %reference, size = bytes.len(), "stored media file");
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reduce a client-supplied file name to a safe single path segment.
pub fn sanitize_file_name(raw: &str) -> String {
    // Clients may send a full path; keep the last segment only
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join the public media prefix and a stored reference
pub fn media_url(prefix: &str, reference: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}
