//! Handler for reel generation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use reels_core::request::RenderRequest;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Success payload for `POST /generate-reel`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReelResponse {
    pub success: bool,
    pub video_url: String,
    /// Processing time, e.g. `"48213ms"`.
    pub duration: String,
}

/// POST /generate-reel
///
/// Runs one render job to completion and returns the public video URL.
/// The request is held open for the whole render. If the client goes away
/// the job future is dropped, which kills the render and removes its file.
pub async fn generate_reel(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> AppResult<Json<GenerateReelResponse>> {
    let Json(request) = payload?;

    let result = state.orchestrator.run(&request).await?;

    Ok(Json(GenerateReelResponse {
        success: true,
        duration: result.duration_label(),
        video_url: result.video_url,
    }))
}
