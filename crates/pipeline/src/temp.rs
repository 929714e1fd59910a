//! Ownership of a job's temporary output file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A temporary file owned by exactly one job.
///
/// [`TempArtifact::remove`] deletes it at the end of the job. If the job
/// future is dropped first (client disconnect, panic, abort), `Drop`
/// deletes it synchronously instead. A file that was never created is not
/// an error.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    released: bool,
}

impl TempArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Failures are logged, never returned.
    pub async fn remove(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Temporary file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary file",
            ),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(
                path = %self.path.display(),
                "Temporary file removed on abandoned job",
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary file",
            ),
        }
    }
}
