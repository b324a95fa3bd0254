use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

use crate::startup::AppState;

/// Landing page with a small prompt form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub version: &'a str,
    pub image_model: &'a str,
    pub video_model: &'a str,
}

/// JSON descriptor for API clients.
#[derive(Debug, Serialize)]
pub struct ApiDescriptor {
    pub message: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
    pub generate_endpoint: &'static str,
    pub generate_video_endpoint: &'static str,
    pub health_endpoint: &'static str,
}

/// GET /: HTML for browsers, a JSON descriptor when the client asks for it.
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if wants_json(&headers) {
        return Ok(Json(ApiDescriptor {
            message: "HuggingFace Image & Video Generator API",
            version: env!("CARGO_PKG_VERSION"),
            docs: "/",
            generate_endpoint: "/generate (POST)",
            generate_video_endpoint: "/generate-video (POST)",
            health_endpoint: "/health (GET)",
        })
        .into_response());
    }

    let page = IndexTemplate {
        version: env!("CARGO_PKG_VERSION"),
        image_model: &state.config.huggingface.image_model,
        video_model: &state.config.huggingface.video_model,
    }
    .render()
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render page: {}", e)))?;

    Ok(Html(page).into_response())
}

/// True when `Accept` names JSON and does not name HTML.
fn wants_json(headers: &HeaderMap) -> bool {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    accept.contains("application/json") && !accept.contains("text/html")
}
