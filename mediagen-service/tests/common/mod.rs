#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use mediagen_service::config::{
    HuggingFaceConfig, MediagenConfig, ProviderKind, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL,
};
use mediagen_service::services::{ImageProvider, MockProvider, VideoProvider};
use mediagen_service::startup::{build_router, AppState};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "hf_test_token";

/// Config built in code so tests never race on process environment.
pub fn test_config(token: Option<&str>, base_url: &str) -> MediagenConfig {
    MediagenConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        huggingface: HuggingFaceConfig {
            token: token.map(|t| Secret::new(t.to_string())),
            base_url: base_url.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            request_timeout: Duration::from_secs(10),
        },
        provider: ProviderKind::Mock,
        cors_allowed_origins: Vec::new(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
    }
}

/// Router wired to `mock` for both image and video.
pub fn mock_router(token: Option<&str>, mock: Arc<MockProvider>) -> axum::Router {
    let image: Arc<dyn ImageProvider> = mock.clone();
    let video: Arc<dyn VideoProvider> = mock;
    let state = AppState::new(test_config(token, "http://unused.invalid"), image, video)
        .expect("Failed to build state");
    build_router(state)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: axum::Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.expect("Request failed")
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    res.into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(res).await).expect("Failed to parse JSON")
}
