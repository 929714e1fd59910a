//! Render engine adapter.
//!
//! A boundary over an external, pre-bundled rendering engine: prepare the
//! engine bundle once, then render one composition per job into a local
//! video file.

pub mod bundle;
pub mod engine;
pub mod remotion;

pub use bundle::{EngineBundle, EngineHandle};
pub use engine::{EngineError, RenderEngine};
