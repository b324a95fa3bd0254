//! Mock provider for local development and tests.

use super::{
    CallContext, ImageParams, ImageProvider, ProviderError, ProviderOutput, VideoProvider,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};

/// PNG signature followed by a marker, enough for clients to sniff the type.
const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmediagen-mock-image";

/// Minimal `ftyp` box of an MP4 container followed by a marker.
const MOCK_MP4: &[u8] = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isommediagen-mock-video";

/// In-process provider that answers every call with canned media.
pub struct MockProvider {
    enabled: bool,
    image_output: ProviderOutput,
    video_output: ProviderOutput,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            image_output: ProviderOutput::Bytes(Bytes::from_static(MOCK_PNG)),
            video_output: ProviderOutput::Bytes(Bytes::from_static(MOCK_MP4)),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer image calls with `output` instead of the canned PNG.
    pub fn with_image_output(mut self, output: ProviderOutput) -> Self {
        self.image_output = output;
        self
    }

    /// Answer video calls with `output` instead of the canned MP4.
    pub fn with_video_output(mut self, output: ProviderOutput) -> Self {
        self.video_output = output;
        self
    }

    /// Fail every call with an API error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of generation calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, output: &ProviderOutput) -> Result<ProviderOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock provider not enabled".to_string(),
            ));
        }

        match &self.failure {
            Some(message) => Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(output.clone()),
        }
    }
}

#[async_trait]
impl ImageProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn text_to_image(
        &self,
        prompt: &str,
        model: &str,
        params: &ImageParams,
        _ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError> {
        tracing::debug!(
            model = %model,
            prompt_len = prompt.len(),
            width = params.width,
            height = params.height,
            "Mock image generation"
        );
        self.respond(&self.image_output)
    }
}

#[async_trait]
impl VideoProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn text_to_video(
        &self,
        prompt: &str,
        model: &str,
        _ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError> {
        tracing::debug!(model = %model, prompt_len = prompt.len(), "Mock video generation");
        self.respond(&self.video_output)
    }
}
