use axum::{extract::State, Json};
use serde::Serialize;

use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub hf_token_configured: bool,
}

/// Liveness plus whether a provider credential is present. Never calls the
/// provider.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        hf_token_configured: state.config.huggingface.token_configured(),
    })
}
