//! Render job orchestrator.
//!
//! Drives one request through a strictly linear sequence of stages:
//!
//! ```text
//! Validating -> Resolving -> Rendering -> Uploading -> CleaningUp -> Done
//!      \             \            \            \
//!       `-------------`------------`------------`--> Failed
//! ```
//!
//! Validation failures are reported before any temporary file or engine
//! work exists. Every later failure passes through `CleaningUp`, so a
//! job's temporary file never outlives the job.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reels_core::error::ReelError;
use reels_core::job::{RenderJob, RenderResult};
use reels_core::request::{InputProps, RenderRequest, DEFAULT_MAX_PHOTOS};
use reels_render::{EngineBundle, EngineHandle};
use reels_storage::ObjectUploader;

use crate::limiter::{Admission, RenderLimiter};
use crate::temp::TempArtifact;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Default wall-clock budget for a single render.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 300;

/// Default number of simultaneous renders.
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 2;

/// Default number of jobs allowed to wait for a render slot.
pub const DEFAULT_MAX_QUEUED_RENDERS: usize = 8;

/// Default longest wait for a render slot before a queued job gives up.
pub const DEFAULT_QUEUE_TIMEOUT_SECS: u64 = 240;

/// Allowance for the upload step when sizing the whole-job budget.
const UPLOAD_ALLOWANCE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Directory holding per-job temporary video files.
    pub output_dir: PathBuf,
    pub render_timeout: Duration,
    /// Longest a job waits for a render slot. Expiry is reported as
    /// [`ReelError::Overloaded`].
    pub queue_timeout: Duration,
    pub max_photos: usize,
    pub max_concurrent_renders: usize,
    pub max_queued_renders: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            queue_timeout: Duration::from_secs(DEFAULT_QUEUE_TIMEOUT_SECS),
            max_photos: DEFAULT_MAX_PHOTOS,
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT_RENDERS,
            max_queued_renders: DEFAULT_MAX_QUEUED_RENDERS,
        }
    }
}

impl OrchestratorSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                  | Default           |
    /// |--------------------------|-------------------|
    /// | `RENDER_OUTPUT_DIR`      | system temp dir   |
    /// | `RENDER_TIMEOUT_SECS`    | `300`             |
    /// | `QUEUE_TIMEOUT_SECS`     | `240`             |
    /// | `MAX_PHOTOS`             | `20`              |
    /// | `MAX_CONCURRENT_RENDERS` | `2`               |
    /// | `MAX_QUEUED_RENDERS`     | `8`               |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let output_dir = std::env::var("RENDER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let render_timeout = env_parse("RENDER_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.render_timeout);

        let queue_timeout = env_parse("QUEUE_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.queue_timeout);

        Self {
            output_dir,
            render_timeout,
            queue_timeout,
            max_photos: env_parse("MAX_PHOTOS").unwrap_or(defaults.max_photos),
            max_concurrent_renders: env_parse("MAX_CONCURRENT_RENDERS")
                .unwrap_or(defaults.max_concurrent_renders),
            max_queued_renders: env_parse("MAX_QUEUED_RENDERS")
                .unwrap_or(defaults.max_queued_renders),
        }
    }

    /// Worst-case wall-clock time of one admitted job: slot wait, render,
    /// and an allowance for the upload. An HTTP gateway in front of the
    /// orchestrator must wait longer than this.
    pub fn job_budget(&self) -> Duration {
        self.queue_timeout + self.render_timeout + UPLOAD_ALLOWANCE
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Validating,
    Resolving,
    Rendering,
    Uploading,
    CleaningUp,
    Done,
    Failed,
}

impl JobStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Rendering => "rendering",
            Self::Uploading => "uploading",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    engine: Arc<EngineHandle>,
    uploader: Arc<dyn ObjectUploader>,
    limiter: RenderLimiter,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<EngineHandle>,
        uploader: Arc<dyn ObjectUploader>,
        settings: OrchestratorSettings,
    ) -> Self {
        let limiter = RenderLimiter::new(
            settings.max_concurrent_renders,
            settings.max_queued_renders,
        );
        Self {
            engine,
            uploader,
            limiter,
            settings,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn limiter(&self) -> &RenderLimiter {
        &self.limiter
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run one request to completion.
    ///
    /// Produces exactly one outcome. On success the rendered file has been
    /// uploaded and removed; on failure no URL is returned and any
    /// temporary file has been removed.
    pub async fn run(&self, request: &RenderRequest) -> Result<RenderResult, ReelError> {
        let started = Instant::now();

        tracing::debug!(stage = %JobStage::Validating, "Validating reel request");
        let template = request.validate(self.settings.max_photos)?;

        tracing::debug!(stage = %JobStage::Resolving, %template, "Resolving composition");
        let composition = template.composition();

        let bundle = self.engine.bundle().ok_or_else(|| {
            ReelError::EngineUnavailable("render engine is still being prepared".into())
        })?;
        let admission = self.limiter.admit()?;

        let props = InputProps::from_request(request, composition.photo_slots);
        let job = RenderJob::new(template, composition, props, &self.settings.output_dir);

        tracing::info!(
            job_id = %job.id,
            template = %job.template,
            composition = job.composition.id,
            property_type = %job.props.property_type,
            region = %job.props.region,
            prix = ?job.props.prix,
            rendering = self.limiter.active(),
            admitted = self.limiter.admitted(),
            "Generating reel",
        );

        let artifact = TempArtifact::new(job.output_path.clone());
        let outcome = self.render_and_upload(&job, &bundle, admission).await;

        tracing::debug!(job_id = %job.id, stage = %JobStage::CleaningUp, "Removing temporary file");
        artifact.remove().await;

        let elapsed = started.elapsed();
        match outcome {
            Ok(video_url) => {
                tracing::info!(
                    job_id = %job.id,
                    stage = %JobStage::Done,
                    video_url = %video_url,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Reel ready",
                );
                Ok(RenderResult {
                    job_id: job.id,
                    video_url,
                    elapsed,
                })
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    stage = %JobStage::Failed,
                    code = e.code(),
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Reel generation failed",
                );
                Err(e)
            }
        }
    }

    /// Rendering and Uploading. Cleanup is the caller's job.
    async fn render_and_upload(
        &self,
        job: &RenderJob,
        bundle: &EngineBundle,
        admission: Admission,
    ) -> Result<String, ReelError> {
        let wait = admission.wait_for_slot();
        let slot = match tokio::time::timeout(self.settings.queue_timeout, wait).await {
            Ok(slot) => slot?,
            Err(_) => {
                tracing::warn!(
                    job_id = %job.id,
                    waited_ms = self.settings.queue_timeout.as_millis() as u64,
                    "No render slot freed up in time",
                );
                return Err(ReelError::Overloaded {
                    capacity: self.limiter.capacity(),
                });
            }
        };

        tracing::debug!(job_id = %job.id, stage = %JobStage::Rendering, "Rendering");
        tokio::fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| ReelError::RenderFailed(format!("cannot create output directory: {e}")))?;

        let budget = self.settings.render_timeout;
        let render = self.engine.engine().render(
            bundle,
            &job.composition,
            &job.props,
            &job.output_path,
        );
        let rendered = match tokio::time::timeout(budget, render).await {
            Ok(Ok(path)) => path,
            Ok(Err(e)) => return Err(ReelError::RenderFailed(e.to_string())),
            Err(_) => return Err(ReelError::RenderTimeout { budget }),
        };
        drop(slot);

        // An engine that wrote elsewhere still must not leak its file.
        let _stray = (rendered != job.output_path).then(|| TempArtifact::new(rendered.clone()));

        tracing::debug!(job_id = %job.id, stage = %JobStage::Uploading, "Uploading");
        self.uploader
            .upload(&rendered, &job.object_name())
            .await
            .map_err(|e| ReelError::UploadFailed(e.to_string()))
    }
}
