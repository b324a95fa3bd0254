use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use bytes::Bytes;
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;
use std::time::Instant;

use crate::dtos::{ImageGenerationRequest, VideoGenerationRequest};
use crate::services::metrics::{record_generation, record_output_bytes, record_provider_latency};
use crate::services::{CallContext, ImageParams, MediaKind, ProviderError, ProviderOutput};
use crate::startup::AppState;
use crate::utils::ValidatedJson;

impl From<&ImageGenerationRequest> for ImageParams {
    fn from(req: &ImageGenerationRequest) -> Self {
        ImageParams {
            width: req.width,
            height: req.height,
            guidance_scale: req.guidance_scale,
            num_inference_steps: req.num_inference_steps,
        }
    }
}

/// POST /generate: prompt in, PNG out.
#[tracing::instrument(skip_all, fields(model = %state.config.huggingface.image_model))]
pub async fn generate_image(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    ValidatedJson(request): ValidatedJson<ImageGenerationRequest>,
) -> Result<Response, AppError> {
    let kind = MediaKind::Image;
    let model = state.config.huggingface.image_model.as_str();
    ensure_credential(&state, kind, model)?;

    tracing::info!(
        prompt_len = request.prompt.len(),
        width = request.width,
        height = request.height,
        "Generating image"
    );

    let ctx = call_context(request_id);
    let provider = state.image_provider.name();
    let started = Instant::now();
    let output = state
        .image_provider
        .text_to_image(&request.prompt, model, &ImageParams::from(&request), &ctx)
        .await;

    let bytes = finish(&state, kind, provider, model, started, output).await?;
    Ok(media_response(kind, bytes))
}

/// POST /generate-video: prompt in, MP4 out. May take minutes.
///
/// Uses the request's `model` if given, otherwise `HF_VIDEO_MODEL`.
#[tracing::instrument(skip_all, fields(model = tracing::field::Empty))]
pub async fn generate_video(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    ValidatedJson(request): ValidatedJson<VideoGenerationRequest>,
) -> Result<Response, AppError> {
    let kind = MediaKind::Video;
    let model = request
        .model
        .as_deref()
        .unwrap_or(state.config.huggingface.video_model.as_str());
    tracing::Span::current().record("model", model);
    ensure_credential(&state, kind, model)?;

    tracing::info!(prompt_len = request.prompt.len(), "Generating video");

    let ctx = call_context(request_id);
    let provider = state.video_provider.name();
    let started = Instant::now();
    let output = state
        .video_provider
        .text_to_video(&request.prompt, model, &ctx)
        .await;

    let bytes = finish(&state, kind, provider, model, started, output).await?;
    Ok(media_response(kind, bytes))
}

fn call_context(request_id: Option<Extension<RequestId>>) -> CallContext {
    CallContext {
        request_id: request_id.map(|Extension(RequestId(id))| id),
    }
}

/// Both endpoints are gated on `HF_TOKEN`; its absence fails the request
/// before any provider call.
fn ensure_credential(state: &AppState, kind: MediaKind, model: &str) -> Result<(), AppError> {
    if state.config.huggingface.token_configured() {
        return Ok(());
    }

    record_generation(kind.as_str(), model, "missing_credential");
    Err(generation_failed(
        kind,
        "HF_TOKEN environment variable not set",
    ))
}

/// Normalize provider output, record metrics, and collapse every failure
/// into a single server error.
async fn finish(
    state: &AppState,
    kind: MediaKind,
    provider: &str,
    model: &str,
    started: Instant,
    output: Result<ProviderOutput, ProviderError>,
) -> Result<Bytes, AppError> {
    let result = match output {
        Ok(output) => state.media.normalize(output).await,
        Err(e) => Err(e),
    };
    record_provider_latency(provider, model, started.elapsed().as_secs_f64());

    match result {
        Ok(bytes) => {
            record_generation(kind.as_str(), model, "success");
            record_output_bytes(kind.as_str(), bytes.len());
            tracing::info!(
                bytes = bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Generation completed"
            );
            Ok(bytes)
        }
        Err(e) => {
            record_generation(kind.as_str(), model, e.kind());
            tracing::error!(provider = %provider, error = %e, "Generation failed");
            Err(generation_failed(kind, e))
        }
    }
}

fn generation_failed(kind: MediaKind, err: impl std::fmt::Display) -> AppError {
    AppError::InternalError(anyhow::anyhow!("{}: {}", kind.failure_prefix(), err))
}

fn media_response(kind: MediaKind, bytes: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, kind.content_type()),
            (header::CONTENT_DISPOSITION, kind.content_disposition()),
        ],
        Body::from(bytes),
    )
        .into_response()
}
