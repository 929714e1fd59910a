//! The uploader boundary.

use std::path::Path;

use async_trait::async_trait;

/// Errors from pushing an artifact to object storage.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("storage is not configured: missing {0}")]
    NotConfigured(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl UploadError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::NotConfigured(_) | Self::Read { .. } | Self::Other(_) => false,
        }
    }
}

/// Pushes finished artifacts to a content store.
///
/// Implementations never delete the local file; that stays with the
/// caller.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Upload the file at `local_path` as `object_name` inside the
    /// configured namespace and return its public URL.
    async fn upload(&self, local_path: &Path, object_name: &str) -> Result<String, UploadError>;
}
