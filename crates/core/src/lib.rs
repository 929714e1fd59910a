//! Domain types for reel generation.
//!
//! Requests, templates, jobs and the error taxonomy shared by the render
//! adapter, the uploader, the orchestrator and the HTTP gateway. This
//! crate performs no I/O.

pub mod error;
pub mod job;
pub mod request;
pub mod template;
