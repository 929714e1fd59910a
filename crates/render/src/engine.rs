//! The render engine boundary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reels_core::request::InputProps;
use reels_core::template::CompositionDescriptor;

use crate::bundle::EngineBundle;

/// Error type for render engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine sources not found: {0}")]
    SourceNotFound(String),

    #[error("engine launcher could not be started: {0}")]
    Launch(std::io::Error),

    #[error("engine bundling failed (exit code {exit_code:?}): {stderr}")]
    BundleFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("composition '{0}' is not registered in the bundle")]
    CompositionNotFound(String),

    #[error("encoding failed (exit code {exit_code:?}): {stderr}")]
    EncodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("engine reported success but wrote no file at {0}")]
    MissingOutput(String),

    #[error("failed to encode input properties: {0}")]
    Props(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external engine that turns a composition plus input properties into
/// an encoded video file.
///
/// Implementations must not block the async runtime: long CPU work belongs
/// in a child process or on the blocking pool. Dropping a `render` future
/// must abort the render.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Build the reusable engine bundle. Called once per process.
    async fn prepare(&self) -> Result<EngineBundle, EngineError>;

    /// Render `composition` with `props` into `output`, returning the path
    /// of the finished file.
    async fn render(
        &self,
        bundle: &EngineBundle,
        composition: &CompositionDescriptor,
        props: &InputProps,
        output: &Path,
    ) -> Result<PathBuf, EngineError>;
}
