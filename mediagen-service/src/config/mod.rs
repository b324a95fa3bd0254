use secrecy::{ExposeSecret, Secret};
use service_core::config::{self as core_config, get_env, get_env_opt};
use service_core::error::AppError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://router.huggingface.co/hf-inference";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_VIDEO_MODEL: &str = "Wan-AI/Wan2.2-T2V-A14B";

/// Video generation routinely takes minutes.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct MediagenConfig {
    pub common: core_config::Config,
    pub huggingface: HuggingFaceConfig,
    pub provider: ProviderKind,
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// `HF_TOKEN`. `None` when unset or blank.
    pub token: Option<Secret<String>>,
    pub base_url: String,
    pub image_model: String,
    pub video_model: String,
    pub request_timeout: Duration,
}

impl HuggingFaceConfig {
    pub fn token_configured(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }
}

/// Which backend serves generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    HuggingFace,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" | "auto" => Ok(ProviderKind::HuggingFace),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENERATION_PROVIDER '{}', expected 'huggingface' or 'mock'",
                other
            ))),
        }
    }
}

impl MediagenConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let request_timeout_secs = get_env(
            "HF_REQUEST_TIMEOUT_SECS",
            Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
        )?
        .parse::<u64>()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("HF_REQUEST_TIMEOUT_SECS is invalid: {}", e))
        })?;

        Ok(MediagenConfig {
            common,
            huggingface: HuggingFaceConfig {
                token: get_env_opt("HF_TOKEN").map(Secret::new),
                base_url: get_env("HF_INFERENCE_BASE_URL", Some(DEFAULT_INFERENCE_BASE_URL))?
                    .trim_end_matches('/')
                    .to_string(),
                image_model: get_env("HF_IMAGE_MODEL", Some(DEFAULT_IMAGE_MODEL))?,
                video_model: get_env("HF_VIDEO_MODEL", Some(DEFAULT_VIDEO_MODEL))?,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
            provider: get_env("GENERATION_PROVIDER", Some("huggingface"))?.parse()?,
            cors_allowed_origins: parse_origins(get_env_opt("CORS_ALLOWED_ORIGINS").as_deref()),
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: get_env_opt("OTLP_ENDPOINT"),
        })
    }
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_known_backends() {
        assert_eq!("huggingface".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert_eq!(" Mock ".parse::<ProviderKind>().unwrap(), ProviderKind::Mock);
        assert_eq!("auto".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert!("replicate".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins(Some("http://a.test, http://b.test ,,"));
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
        assert!(parse_origins(None).is_empty());
    }

    #[test]
    fn empty_token_is_not_configured() {
        let mut hf = HuggingFaceConfig {
            token: Some(Secret::new(String::new())),
            base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            request_timeout: Duration::from_secs(1),
        };
        assert!(!hf.token_configured());

        hf.token = Some(Secret::new("hf_abc".to_string()));
        assert!(hf.token_configured());

        hf.token = None;
        assert!(!hf.token_configured());
    }
}
