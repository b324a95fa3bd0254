//! Hugging Face inference provider.
//!
//! Calls the hosted inference router: `POST {base_url}/models/{model}` with
//! `{"inputs": prompt, "parameters": {...}}` and bearer auth. The router
//! answers with raw media bytes, or with JSON that carries base64 data or a
//! link to the finished asset.

use super::{
    CallContext, ImageParams, ImageProvider, ProviderError, ProviderOutput, VideoProvider,
};
use crate::config::HuggingFaceConfig;
use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::observability::TracedClientExt;

const PROVIDER_NAME: &str = "huggingface";

/// Hugging Face inference client for both image and video models.
pub struct HuggingFaceProvider {
    client: Client,
    token: Option<Secret<String>>,
    base_url: Url,
}

impl HuggingFaceProvider {
    pub fn new(config: &HuggingFaceConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ProviderError::NotConfigured(format!(
                "invalid HF_INFERENCE_BASE_URL '{}': {}",
                config.base_url, e
            ))
        })?;

        Ok(Self {
            client,
            token: config.token.clone(),
            base_url,
        })
    }

    /// `{base_url}/models/{org}/{name}`, one path segment per id part.
    ///
    /// Segments are percent-encoded by `Url`, and empty or dot segments are
    /// refused so the request can never leave the `/models/` prefix.
    fn model_url(&self, model: &str) -> Result<Url, ProviderError> {
        let segments: Vec<&str> = model.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(ProviderError::InvalidModel(model.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::NotConfigured(format!(
                    "HF_INFERENCE_BASE_URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("models")
            .extend(segments);

        Ok(url)
    }

    async fn infer<P: Serialize + Sync>(
        &self,
        model: &str,
        accept: &str,
        payload: &InferenceRequest<'_, P>,
        ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("HF_TOKEN is not set".to_string()))?;

        let url = self.model_url(model)?;

        tracing::debug!(
            model = %model,
            prompt_len = payload.inputs.len(),
            "Sending request to Hugging Face inference API"
        );

        let response = self
            .client
            .traced_post(url.as_str())
            .bearer_auth(token.expose_secret())
            .header(header::ACCEPT.as_str(), accept)
            .json(payload)
            .request_id(ctx.request_id.as_deref())
            .send()
            .await?;

        parse_response(response).await
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn text_to_image(
        &self,
        prompt: &str,
        model: &str,
        params: &ImageParams,
        ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError> {
        let payload = InferenceRequest {
            inputs: prompt,
            parameters: Some(ImageParameters {
                width: params.width,
                height: params.height,
                guidance_scale: params.guidance_scale,
                num_inference_steps: params.num_inference_steps,
            }),
        };

        self.infer(model, "image/png", &payload, ctx).await
    }
}

#[async_trait]
impl VideoProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn text_to_video(
        &self,
        prompt: &str,
        model: &str,
        ctx: &CallContext,
    ) -> Result<ProviderOutput, ProviderError> {
        let payload: InferenceRequest<'_, ()> = InferenceRequest {
            inputs: prompt,
            parameters: None,
        };

        self.infer(model, "video/mp4", &payload, ctx).await
    }
}

async fn parse_response(response: Response) -> Result<ProviderOutput, ProviderError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.into_message())
            .unwrap_or(body);

        tracing::warn!(status = %status, error = %message, "Hugging Face API returned an error");

        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let value: Value = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("failed to parse JSON response: {}", e))
        })?;
        return output_from_json(&value);
    }

    Ok(ProviderOutput::Bytes(response.bytes().await?))
}

/// Pick the media reference out of a JSON success body.
///
/// Recognizes the shapes the router's backends use: a bare `url`, nested
/// `video`/`image` objects, `images`/`data`/`output` arrays, and base64 under
/// `b64_json`, `image`, `video` or `data`.
fn output_from_json(value: &Value) -> Result<ProviderOutput, ProviderError> {
    const URL_POINTERS: &[&str] = &[
        "/url",
        "/video/url",
        "/image/url",
        "/images/0/url",
        "/videos/0/url",
        "/data/0/url",
        "/output/0",
        "/output",
    ];
    const BASE64_POINTERS: &[&str] = &[
        "/b64_json",
        "/data/0/b64_json",
        "/image",
        "/video",
        "/data",
    ];

    for pointer in URL_POINTERS {
        if let Some(url) = value.pointer(pointer).and_then(Value::as_str) {
            if url.starts_with("http://") || url.starts_with("https://") {
                return Ok(ProviderOutput::Url(url.to_string()));
            }
        }
    }

    for pointer in BASE64_POINTERS {
        if let Some(data) = value.pointer(pointer).and_then(Value::as_str) {
            if !data.is_empty() {
                return Ok(ProviderOutput::Base64(data.to_string()));
            }
        }
    }

    Err(ProviderError::InvalidResponse(format!(
        "unrecognized JSON payload: {}",
        truncate(&value.to_string(), 200)
    )))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Hugging Face API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct InferenceRequest<'a, P> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<P>,
}

#[derive(Debug, Serialize)]
struct ImageParameters {
    width: u32,
    height: u32,
    guidance_scale: f64,
    num_inference_steps: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

/// `error` is a plain string on the classic API and a list on some backends.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl ApiErrorMessage {
    fn into_message(self) -> String {
        match self {
            ApiErrorMessage::Single(msg) => msg,
            ApiErrorMessage::Many(msgs) => msgs.join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, token: Option<&str>) -> HuggingFaceProvider {
        HuggingFaceProvider::new(&HuggingFaceConfig {
            token: token.map(|t| Secret::new(t.to_string())),
            base_url: base_url.to_string(),
            image_model: "black-forest-labs/FLUX.1-schnell".to_string(),
            video_model: "Wan-AI/Wan2.2-T2V-A14B".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn params() -> ImageParams {
        ImageParams {
            width: 1024,
            height: 576,
            guidance_scale: 7.5,
            num_inference_steps: 4,
        }
    }

    #[tokio::test]
    async fn image_request_carries_prompt_parameters_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/black-forest-labs/FLUX.1-schnell"))
            .and(header_eq("authorization", "Bearer hf_test"))
            .and(header_eq("x-request-id", "req-1"))
            .and(body_json(json!({
                "inputs": "a red fox",
                "parameters": {
                    "width": 1024,
                    "height": 576,
                    "guidance_scale": 7.5,
                    "num_inference_steps": 4
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(b"png-bytes".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = CallContext {
            request_id: Some("req-1".to_string()),
        };
        let out = provider(&server.uri(), Some("hf_test"))
            .text_to_image("a red fox", "black-forest-labs/FLUX.1-schnell", &params(), &ctx)
            .await
            .unwrap();

        assert_eq!(out, ProviderOutput::Bytes(bytes::Bytes::from_static(b"png-bytes")));
    }

    #[tokio::test]
    async fn video_request_sends_only_inputs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Wan-AI/Wan2.2-T2V-A14B"))
            .and(body_json(json!({ "inputs": "waves at dusk" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(b"mp4".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let out = provider(&server.uri(), Some("hf_test"))
            .text_to_video("waves at dusk", "Wan-AI/Wan2.2-T2V-A14B", &CallContext::default())
            .await
            .unwrap();

        assert_eq!(out, ProviderOutput::Bytes(bytes::Bytes::from_static(b"mp4")));
    }

    #[tokio::test]
    async fn json_with_video_url_becomes_url_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "video": { "url": "https://cdn.example.com/out.mp4" }
            })))
            .mount(&server)
            .await;

        let out = provider(&server.uri(), Some("hf_test"))
            .text_to_video("x", "some/model", &CallContext::default())
            .await
            .unwrap();

        assert_eq!(
            out,
            ProviderOutput::Url("https://cdn.example.com/out.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": "Model black-forest-labs/FLUX.1-schnell is currently loading"
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Some("hf_test"))
            .text_to_image("x", "black-forest-labs/FLUX.1-schnell", &params(), &CallContext::default())
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(
                    message,
                    "Model black-forest-labs/FLUX.1-schnell is currently loading"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Some("hf_test"))
            .text_to_video("x", "some/model", &CallContext::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn missing_token_fails_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server.uri(), None)
            .text_to_image("x", "m", &params(), &CallContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn model_url_keeps_base_path_and_splits_repo_id() {
        let hf = provider("https://router.huggingface.co/hf-inference/", Some("hf_test"));
        assert_eq!(
            hf.model_url("Wan-AI/Wan2.2-T2V-A14B").unwrap().as_str(),
            "https://router.huggingface.co/hf-inference/models/Wan-AI/Wan2.2-T2V-A14B"
        );

        let hf = provider("http://127.0.0.1:9000", Some("hf_test"));
        assert_eq!(
            hf.model_url("gpt2").unwrap().as_str(),
            "http://127.0.0.1:9000/models/gpt2"
        );
    }

    #[test]
    fn model_url_encodes_query_characters() {
        let hf = provider("http://127.0.0.1:9000/hf-inference", Some("hf_test"));
        let url = hf.model_url("a?b").unwrap();

        assert_eq!(url.path(), "/hf-inference/models/a%3Fb");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = HuggingFaceProvider::new(&HuggingFaceConfig {
            token: None,
            base_url: "not a url".to_string(),
            image_model: "black-forest-labs/FLUX.1-schnell".to_string(),
            video_model: "Wan-AI/Wan2.2-T2V-A14B".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .err()
        .unwrap();

        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn dot_segments_in_model_never_reach_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"leaked".to_vec()))
            .expect(0)
            .mount(&server)
            .await;
        let base = format!("{}/hf-inference", server.uri());

        for model in ["../../admin/secret", "org/..", "./x", "org//name", ""] {
            let err = provider(&base, Some("hf_test"))
                .text_to_video("x", model, &CallContext::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::InvalidModel(_)), "{model}");
        }
    }

    #[test]
    fn json_shapes_are_recognized() {
        assert_eq!(
            output_from_json(&json!({ "images": [{ "url": "https://x/a.png" }] })).unwrap(),
            ProviderOutput::Url("https://x/a.png".to_string())
        );
        assert_eq!(
            output_from_json(&json!({ "output": ["https://x/b.mp4"] })).unwrap(),
            ProviderOutput::Url("https://x/b.mp4".to_string())
        );
        assert_eq!(
            output_from_json(&json!({ "data": [{ "b64_json": "aGk=" }] })).unwrap(),
            ProviderOutput::Base64("aGk=".to_string())
        );
        assert_eq!(
            output_from_json(&json!({ "image": "data:image/png;base64,aGk=" })).unwrap(),
            ProviderOutput::Base64("data:image/png;base64,aGk=".to_string())
        );
        assert!(output_from_json(&json!({ "status": "queued" })).is_err());
    }
}
