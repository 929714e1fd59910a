use std::sync::Arc;

use reels_pipeline::Orchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Render job orchestrator; owns the engine handle and uploader.
    pub orchestrator: Arc<Orchestrator>,
}
