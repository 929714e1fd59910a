//! Integration tests for `POST /generate-reel`.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use reels_pipeline::OrchestratorSettings;

use common::{
    body_json, build_test_app, build_test_app_with, post_json, post_raw, reel_body, PUBLIC_BASE,
};

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_request_returns_video_url_and_duration() {
    let app = build_test_app(true, false, false);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let url = json["videoUrl"].as_str().unwrap();
    let prefix = format!("{PUBLIC_BASE}/reels/");
    assert!(url.starts_with(&prefix), "unexpected url {url}");
    assert!(url.ends_with(".mp4"));
    let id = &url[prefix.len()..url.len() - ".mp4".len()];
    assert_eq!(id.len(), 36, "object name should be a uuid: {id}");

    let duration = json["duration"].as_str().unwrap();
    let millis = duration.strip_suffix("ms").unwrap();
    assert!(millis.parse::<u64>().is_ok());

    assert_eq!(app.temp_file_count(), 0);
}

#[tokio::test]
async fn blur_template_is_accepted() {
    let app = build_test_app(true, false, false);
    let mut body = reel_body(6);
    body["template"] = "blur".into();

    let response = post_json(app.router.clone(), "/generate-reel", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn two_requests_get_distinct_urls() {
    let app = build_test_app(true, false, false);
    let first = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;
    let second = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;
    let (first, second) = (body_json(first).await, body_json(second).await);

    assert_ne!(first["videoUrl"], second["videoUrl"]);
}

// ---------------------------------------------------------------------------
// Validation failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_photos_returns_400() {
    let app = build_test_app(true, false, false);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(4)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "INSUFFICIENT_PHOTOS");
    assert!(json["error"].as_str().unwrap().contains('5'));
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 0);
    assert_eq!(app.uploader.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn too_many_photos_returns_400() {
    let app = build_test_app(true, false, false);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(21)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "TOO_MANY_PHOTOS");
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_template_returns_400_listing_valid_ones() {
    let app = build_test_app(true, false, false);
    let mut body = reel_body(5);
    body["template"] = "fancy".into();

    let response = post_json(app.router.clone(), "/generate-reel", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TEMPLATE");
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("default"));
    assert!(message.contains("blur"));
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = build_test_app(true, false, false);
    let response = post_raw(app.router, "/generate-reel", "{not json".into()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn few_photos_without_price_reports_insufficient_photos() {
    let app = build_test_app(true, false, false);
    let mut body = reel_body(3);
    body.as_object_mut().unwrap().remove("prix");
    body.as_object_mut().unwrap().remove("surface");

    let response = post_json(app.router.clone(), "/generate-reel", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_PHOTOS");
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_numeric_price_returns_400() {
    let app = build_test_app(true, false, false);
    let mut body = reel_body(5);
    body["prix"] = "cher".into();

    let response = post_json(app.router, "/generate-reel", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Engine and adapter failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unprepared_engine_returns_503() {
    let app = build_test_app(false, false, false);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "ENGINE_UNAVAILABLE");
    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn render_failure_returns_500_without_upload() {
    let app = build_test_app(true, true, false);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "RENDER_FAILED");
    assert!(json.get("videoUrl").is_none());
    assert_eq!(app.uploader.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(app.temp_file_count(), 0);
}

#[tokio::test]
async fn upload_failure_returns_500_and_cleans_up() {
    let app = build_test_app(true, false, true);
    let response = post_json(app.router.clone(), "/generate-reel", reel_body(5)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "UPLOAD_FAILED");
    assert_eq!(app.uploader.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(app.temp_file_count(), 0);
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queued_request_that_waits_too_long_gets_overloaded_json() {
    let app = build_test_app_with(true, false, false, Duration::from_millis(600), |s| {
        OrchestratorSettings {
            max_concurrent_renders: 1,
            max_queued_renders: 1,
            queue_timeout: Duration::from_millis(150),
            ..s
        }
    });

    let (a, b) = tokio::join!(
        post_json(app.router.clone(), "/generate-reel", reel_body(5)),
        post_json(app.router.clone(), "/generate-reel", reel_body(5)),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE]);

    let rejected = if a.status() == StatusCode::OK { b } else { a };
    let json = body_json(rejected).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "OVERLOADED");
    assert!(json["error"].is_string());

    assert_eq!(app.engine.renders.load(Ordering::SeqCst), 1);
    assert_eq!(app.temp_file_count(), 0);
}
