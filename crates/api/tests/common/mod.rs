#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use reels_core::request::InputProps;
use reels_core::template::CompositionDescriptor;
use reels_pipeline::{Orchestrator, OrchestratorSettings};
use reels_render::{EngineBundle, EngineError, EngineHandle, RenderEngine};
use reels_storage::{ObjectUploader, UploadError};
use tower::ServiceExt;

use reels_api::config::ServerConfig;
use reels_api::router::build_app_router;
use reels_api::state::AppState;

pub const PUBLIC_BASE: &str = "https://cdn.example.com";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Engine that writes a small file, or fails with an encode error.
pub struct FakeEngine {
    pub fail: bool,
    pub delay: Duration,
    pub renders: AtomicUsize,
}

impl FakeEngine {
    pub fn new(fail: bool, delay: Duration) -> Self {
        Self {
            fail,
            delay,
            renders: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn prepare(&self) -> Result<EngineBundle, EngineError> {
        Ok(bundle())
    }

    async fn render(
        &self,
        _bundle: &EngineBundle,
        _composition: &CompositionDescriptor,
        _props: &InputProps,
        output: &Path,
    ) -> Result<PathBuf, EngineError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(output, b"video").await?;
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(EngineError::EncodeFailed {
                exit_code: Some(1),
                stderr: "encoder crashed".into(),
            });
        }
        Ok(output.to_path_buf())
    }
}

pub struct FakeUploader {
    pub fail: bool,
    pub uploads: AtomicUsize,
}

impl FakeUploader {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            uploads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectUploader for FakeUploader {
    async fn upload(&self, _local_path: &Path, object_name: &str) -> Result<String, UploadError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UploadError::Network("connection reset".into()));
        }
        Ok(format!("{PUBLIC_BASE}/reels/{object_name}"))
    }
}

pub fn bundle() -> EngineBundle {
    EngineBundle {
        serve_url: "/srv/bundle".into(),
        prepared_at: Utc::now(),
        build_time: Duration::ZERO,
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Everything a test needs to drive the app and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub engine: Arc<FakeEngine>,
    pub handle: Arc<EngineHandle>,
    pub uploader: Arc<FakeUploader>,
    pub output_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn temp_file_count(&self) -> usize {
        std::fs::read_dir(self.output_dir.path()).unwrap().count()
    }
}

/// Build the full application router with all middleware layers against
/// fake adapters.
///
/// `ready` controls whether the engine bundle is already prepared.
pub fn build_test_app(ready: bool, engine_fails: bool, upload_fails: bool) -> TestApp {
    build_test_app_with(
        ready,
        engine_fails,
        upload_fails,
        Duration::from_millis(2),
        |settings| settings,
    )
}

/// Like [`build_test_app`], with a custom render duration and tuned
/// orchestrator settings.
pub fn build_test_app_with(
    ready: bool,
    engine_fails: bool,
    upload_fails: bool,
    render_delay: Duration,
    tune: impl FnOnce(OrchestratorSettings) -> OrchestratorSettings,
) -> TestApp {
    let config = test_config();
    let output_dir = tempfile::tempdir().unwrap();

    let engine = Arc::new(FakeEngine::new(engine_fails, render_delay));
    let handle = if ready {
        EngineHandle::with_bundle(engine.clone(), bundle())
    } else {
        EngineHandle::new(engine.clone())
    };
    let handle = Arc::new(handle);
    let uploader = Arc::new(FakeUploader::new(upload_fails));

    let settings = tune(OrchestratorSettings {
        output_dir: output_dir.path().to_path_buf(),
        render_timeout: Duration::from_secs(5),
        ..OrchestratorSettings::default()
    });
    let orchestrator = Orchestrator::new(handle.clone(), uploader.clone(), settings);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    TestApp {
        router: build_app_router(state, &config),
        engine,
        handle,
        uploader,
        output_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, json.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}

/// A valid request body with `photos` photo URLs.
pub fn reel_body(photos: usize) -> serde_json::Value {
    let photos: Vec<String> = (1..=photos)
        .map(|i| format!("https://img.example.com/{i}.jpg"))
        .collect();
    serde_json::json!({
        "photos": photos,
        "prix": 350000,
        "surface": 85,
        "region": "Paris 15e",
        "type": "Appartement",
        "email": "contact@agence.fr",
        "telephone": "06 12 34 56 78",
    })
}
