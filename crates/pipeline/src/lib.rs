//! Reel render pipeline.
//!
//! The orchestrator that takes a validated request through rendering,
//! upload and cleanup, plus the concurrency limiter and temporary-file
//! guard it relies on.

pub mod limiter;
pub mod orchestrator;
pub mod temp;

pub use orchestrator::{JobStage, Orchestrator, OrchestratorSettings};
