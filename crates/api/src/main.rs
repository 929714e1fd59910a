use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reels_api::config::ServerConfig;
use reels_api::router::build_app_router;
use reels_api::state::AppState;
use reels_pipeline::{Orchestrator, OrchestratorSettings};
use reels_render::remotion::{RemotionCli, RemotionConfig};
use reels_render::EngineHandle;
use reels_storage::{S3Uploader, StorageConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reels_api=debug,reels_pipeline=debug,reels_render=debug,reels_storage=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid server configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Render engine ---
    let remotion = RemotionConfig::from_env();
    if let Err(e) = remotion.verify_sources() {
        tracing::error!(error = %e, "Render engine sources missing");
        return ExitCode::FAILURE;
    }
    let engine = Arc::new(EngineHandle::new(Arc::new(RemotionCli::new(remotion))));

    // --- Storage ---
    let uploader = Arc::new(S3Uploader::new(StorageConfig::from_env()));
    tracing::info!(configured = uploader.is_configured(), "Object storage uploader created");

    // --- Orchestrator ---
    let settings = OrchestratorSettings::from_env();
    tracing::info!(
        render_timeout_secs = settings.render_timeout.as_secs(),
        queue_timeout_secs = settings.queue_timeout.as_secs(),
        max_concurrent = settings.max_concurrent_renders,
        max_queued = settings.max_queued_renders,
        max_photos = settings.max_photos,
        "Loaded render settings",
    );
    // The gateway timeout must outlast a queued job's worst case, or a
    // slow job is cut off with an empty 408 instead of a JSON error.
    if let Err(e) = config.ensure_outlasts(settings.job_budget()) {
        tracing::error!(error = %e, "Request timeout shorter than render budget");
        return ExitCode::FAILURE;
    }
    let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&engine), uploader, settings));

    // --- Engine preparation ---
    // Runs in the background so /health answers while the bundle builds.
    // A failed preparation stops the server.
    let fatal = CancellationToken::new();
    let prepare_handle = {
        let engine = Arc::clone(&engine);
        let fatal = fatal.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.get_or_prepare().await {
                tracing::error!(error = %e, "Render engine preparation failed");
                fatal.cancel();
            }
        })
    };

    // --- App state ---
    let state = AppState { orchestrator };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = match config.host.parse() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            return ExitCode::FAILURE;
        }
    };
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = {
        let fatal = fatal.clone();
        async move {
            tokio::select! {
                () = shutdown_signal() => {}
                () = fatal.cancelled() => {
                    tracing::error!("Shutting down after fatal engine error");
                }
            }
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if !prepare_handle.is_finished() {
        prepare_handle.abort();
        let _ = tokio::time::timeout(Duration::from_secs(5), prepare_handle).await;
        tracing::info!("Engine preparation cancelled");
    }

    if fatal.is_cancelled() {
        return ExitCode::FAILURE;
    }

    tracing::info!("Graceful shutdown complete");
    ExitCode::SUCCESS
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
