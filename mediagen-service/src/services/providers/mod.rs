//! Generation provider abstractions and implementations.
//!
//! Handlers talk to [`ImageProvider`] and [`VideoProvider`] trait objects so
//! the hosted Hugging Face backend and the in-process mock are
//! interchangeable.

pub mod huggingface;
pub mod media;
pub mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

pub use huggingface::HuggingFaceProvider;
pub use media::{MediaKind, MediaNormalizer};
pub use mock::MockProvider;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid model id: {0}")]
    InvalidModel(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Api { .. } => "api",
            ProviderError::Network(_) => "network",
            ProviderError::InvalidModel(_) => "invalid_model",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

/// What a provider hands back before normalization.
///
/// Hosted backends answer with raw media, inline base64, or a link to the
/// finished asset; local backends may leave the result on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    Bytes(Bytes),
    Base64(String),
    Url(String),
    Path(PathBuf),
}

/// Image knobs passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f64,
    pub num_inference_steps: u32,
}

/// Per-call context forwarded to the upstream request.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub request_id: Option<String>,
}

/// Text-to-image backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn text_to_image(
        &self,
        prompt: &str,
        model: &str,
        params: &ImageParams,
        ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError>;
}

/// Text-to-video backend.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn text_to_video(
        &self,
        prompt: &str,
        model: &str,
        ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError>;
}
