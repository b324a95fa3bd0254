//! Normalization of provider output into a single byte buffer.

use super::{ProviderError, ProviderOutput};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::Client;
use service_core::observability::TracedClientExt;
use std::time::Duration;

/// The two media types this service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image/png",
            MediaKind::Video => "video/mp4",
        }
    }

    pub fn content_disposition(self) -> &'static str {
        match self {
            MediaKind::Image => "inline; filename=generated_image.png",
            MediaKind::Video => "inline; filename=generated_video.mp4",
        }
    }

    /// Prefix for error details, e.g. "Image generation failed".
    pub fn failure_prefix(self) -> &'static str {
        match self {
            MediaKind::Image => "Image generation failed",
            MediaKind::Video => "Video generation failed",
        }
    }
}

/// Turns every [`ProviderOutput`] variant into bytes.
///
/// Owns its own HTTP client for downloading provider-hosted assets.
#[derive(Clone)]
pub struct MediaNormalizer {
    client: Client,
}

impl MediaNormalizer {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn normalize(&self, output: ProviderOutput) -> Result<Bytes, ProviderError> {
        let bytes = match output {
            ProviderOutput::Bytes(bytes) => bytes,
            ProviderOutput::Base64(encoded) => decode_base64(&encoded)?,
            ProviderOutput::Path(path) => {
                tracing::debug!(path = %path.display(), "Reading provider output from disk");
                Bytes::from(tokio::fs::read(&path).await?)
            }
            ProviderOutput::Url(url) => self.download(&url).await?,
        };

        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "provider returned an empty payload".to_string(),
            ));
        }

        Ok(bytes)
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProviderError> {
        tracing::debug!(url = %url, "Downloading provider-hosted asset");

        let response = self.client.traced_get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: format!("asset download from {} failed: {}", url, message),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Decode plain or `data:<mime>;base64,` encoded payloads.
fn decode_base64(encoded: &str) -> Result<Bytes, ProviderError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| ProviderError::InvalidResponse(format!("invalid base64 payload: {}", e)))
}
