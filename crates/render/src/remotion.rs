//! Render engine backed by the Remotion command-line renderer.
//!
//! Preparation runs `remotion bundle` once to produce a static bundle
//! directory; each job runs `remotion render` against that bundle in a
//! child process. Child processes are killed when their future is dropped,
//! which is how a timed-out render is aborted.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reels_core::request::InputProps;
use reels_core::template::CompositionDescriptor;
use tokio::process::Command;

use crate::bundle::EngineBundle;
use crate::engine::{EngineError, RenderEngine};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default launcher used to invoke the Remotion CLI.
const DEFAULT_LAUNCHER: &str = "npx";

/// Default composition entry point, relative to the working directory.
const DEFAULT_ENTRY_POINT: &str = "src/remotion/index.jsx";

/// Video codec passed to every render.
const CODEC: &str = "h264";

/// Marker the CLI prints when asked for a composition the bundle lacks.
const COMPOSITION_MISSING_MARKER: &str = "Could not find composition";

/// Settings for [`RemotionCli`].
#[derive(Debug, Clone)]
pub struct RemotionConfig {
    /// Program that runs the CLI (`npx`, or a path to a `remotion` binary
    /// when `launcher_args` is empty).
    pub launcher: String,
    /// Arguments placed before the CLI subcommand, e.g. `["remotion"]`.
    pub launcher_args: Vec<String>,
    /// Composition root registering every composition.
    pub entry_point: PathBuf,
    /// Directory the bundle is written to.
    pub bundle_dir: PathBuf,
}

impl RemotionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                    |
    /// |----------------------|----------------------------|
    /// | `RENDER_CLI`         | `npx`                      |
    /// | `RENDER_ENTRY_POINT` | `src/remotion/index.jsx`   |
    /// | `RENDER_BUNDLE_DIR`  | `<tmp>/reels-bundle`       |
    pub fn from_env() -> Self {
        let launcher = std::env::var("RENDER_CLI").unwrap_or_else(|_| DEFAULT_LAUNCHER.into());
        // `npx` needs the package name; a direct binary does not.
        let launcher_args = if launcher == DEFAULT_LAUNCHER {
            vec!["remotion".to_string()]
        } else {
            Vec::new()
        };

        let entry_point = std::env::var("RENDER_ENTRY_POINT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENTRY_POINT));

        let bundle_dir = std::env::var("RENDER_BUNDLE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("reels-bundle"));

        Self {
            launcher,
            launcher_args,
            entry_point,
            bundle_dir,
        }
    }

    /// Fail unless the entry point exists.
    ///
    /// Called at startup, before the server accepts traffic.
    pub fn verify_sources(&self) -> Result<(), EngineError> {
        if self.entry_point.is_file() {
            Ok(())
        } else {
            Err(EngineError::SourceNotFound(
                self.entry_point.to_string_lossy().to_string(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct RemotionCli {
    config: RemotionConfig,
}

impl RemotionCli {
    pub fn new(config: RemotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemotionConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.launcher);
        cmd.args(&self.config.launcher_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Build the argument list for `remotion render`.
pub fn render_args(
    serve_url: &str,
    composition: &CompositionDescriptor,
    props: &InputProps,
    output: &Path,
) -> Result<Vec<String>, EngineError> {
    Ok(vec![
        "render".to_string(),
        serve_url.to_string(),
        composition.id.to_string(),
        output.to_string_lossy().to_string(),
        format!("--props={}", serde_json::to_string(props)?),
        format!("--codec={CODEC}"),
        "--log=error".to_string(),
    ])
}

#[async_trait]
impl RenderEngine for RemotionCli {
    async fn prepare(&self) -> Result<EngineBundle, EngineError> {
        self.config.verify_sources()?;
        tokio::fs::create_dir_all(&self.config.bundle_dir).await?;

        let started = Instant::now();
        let output = self
            .command()
            .arg("bundle")
            .arg(&self.config.entry_point)
            .arg("--out-dir")
            .arg(&self.config.bundle_dir)
            .output()
            .await
            .map_err(EngineError::Launch)?;

        if !output.status.success() {
            return Err(EngineError::BundleFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(EngineBundle {
            serve_url: self.config.bundle_dir.to_string_lossy().to_string(),
            prepared_at: Utc::now(),
            build_time: started.elapsed(),
        })
    }

    async fn render(
        &self,
        bundle: &EngineBundle,
        composition: &CompositionDescriptor,
        props: &InputProps,
        output: &Path,
    ) -> Result<PathBuf, EngineError> {
        let args = render_args(&bundle.serve_url, composition, props, output)?;

        tracing::debug!(
            composition = composition.id,
            output = %output.display(),
            "Spawning renderer",
        );

        let result = self
            .command()
            .args(&args)
            .output()
            .await
            .map_err(EngineError::Launch)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).to_string();
            if stderr.contains(COMPOSITION_MISSING_MARKER) {
                return Err(EngineError::CompositionNotFound(composition.id.to_string()));
            }
            return Err(EngineError::EncodeFailed {
                exit_code: result.status.code(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(output).await? {
            return Err(EngineError::MissingOutput(
                output.to_string_lossy().to_string(),
            ));
        }

        Ok(output.to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
