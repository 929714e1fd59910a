//! Render jobs and their outcomes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::request::InputProps;
use crate::template::{CompositionDescriptor, TemplateKind};

/// File extension of every rendered reel.
pub const VIDEO_EXTENSION: &str = "mp4";

/// MIME type of every rendered reel.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Unique identifier of a render job (random 128-bit UUID v4).
///
/// It names the temporary output file and the uploaded object, so its
/// uniqueness is what keeps concurrent jobs from touching each other's
/// files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// `<job-id>.mp4`
    pub fn file_name(&self) -> String {
        format!("{}.{VIDEO_EXTENSION}", self.0)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated request bound to a composition and an output location.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub id: JobId,
    pub template: TemplateKind,
    pub composition: CompositionDescriptor,
    pub props: InputProps,
    /// Where the engine writes the video. Owned by this job alone.
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl RenderJob {
    /// Create a job with a fresh identifier whose output file lives in
    /// `output_dir`.
    pub fn new(
        template: TemplateKind,
        composition: CompositionDescriptor,
        props: InputProps,
        output_dir: &Path,
    ) -> Self {
        let id = JobId::new();
        Self {
            output_path: output_dir.join(id.file_name()),
            id,
            template,
            composition,
            props,
            started_at: Utc::now(),
        }
    }

    /// Name of the uploaded object, relative to the storage namespace.
    pub fn object_name(&self) -> String {
        self.id.file_name()
    }
}

/// A successfully rendered and published reel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub job_id: JobId,
    pub video_url: String,
    /// Wall-clock time from validation to the end of cleanup.
    pub elapsed: Duration,
}

impl RenderResult {
    /// Elapsed time as `"<millis>ms"`.
    pub fn duration_label(&self) -> String {
        format!("{}ms", self.elapsed.as_millis())
    }
}
