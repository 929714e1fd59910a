//! The prepared engine bundle and its process-wide handle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::engine::{EngineError, RenderEngine};

/// The engine's prepared, reusable assets.
///
/// Built once per process and shared read-only by every job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBundle {
    /// Location the engine renders from (a bundle directory or URL).
    pub serve_url: String,
    pub prepared_at: DateTime<Utc>,
    pub build_time: Duration,
}

/// Shared owner of the render engine and its one-time preparation.
///
/// The bundle slot is write-once: once ready, a handle never reports
/// itself unprepared again. Concurrent callers of
/// [`EngineHandle::get_or_prepare`] share a single preparation.
pub struct EngineHandle {
    engine: Arc<dyn RenderEngine>,
    bundle: OnceCell<Arc<EngineBundle>>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            bundle: OnceCell::new(),
        }
    }

    /// A handle whose bundle is already prepared.
    pub fn with_bundle(engine: Arc<dyn RenderEngine>, bundle: EngineBundle) -> Self {
        Self {
            engine,
            bundle: OnceCell::new_with(Some(Arc::new(bundle))),
        }
    }

    pub fn engine(&self) -> &dyn RenderEngine {
        self.engine.as_ref()
    }

    /// The prepared bundle, or `None` while preparation has not completed.
    pub fn bundle(&self) -> Option<Arc<EngineBundle>> {
        self.bundle.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.bundle.initialized()
    }

    /// Return the bundle, preparing it first if needed.
    ///
    /// A failed preparation leaves the slot empty so a later call may try
    /// again.
    pub async fn get_or_prepare(&self) -> Result<Arc<EngineBundle>, EngineError> {
        let bundle = self
            .bundle
            .get_or_try_init(|| async {
                tracing::info!("Preparing render engine bundle");
                let started = Instant::now();
                let bundle = self.engine.prepare().await?;
                tracing::info!(
                    serve_url = %bundle.serve_url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Render engine bundle ready",
                );
                Ok::<_, EngineError>(Arc::new(bundle))
            })
            .await?;
        Ok(Arc::clone(bundle))
    }
}
