use axum::{routing::post, Router};

use crate::handlers;
use crate::state::AppState;

/// Reel generation routes.
///
/// ```text
/// POST /generate-reel    render, upload, return URL
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/generate-reel", post(handlers::reels::generate_reel))
}
