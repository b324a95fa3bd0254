//! Application startup and lifecycle management.

use crate::config::{MediagenConfig, ProviderKind};
use crate::handlers::{generate_image, generate_video, health_check, index, metrics};
use crate::services::{
    HuggingFaceProvider, ImageProvider, MediaNormalizer, MockProvider, ProviderError,
    VideoProvider,
};
use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: MediagenConfig,
    pub image_provider: Arc<dyn ImageProvider>,
    pub video_provider: Arc<dyn VideoProvider>,
    pub media: MediaNormalizer,
}

impl AppState {
    pub fn new(
        config: MediagenConfig,
        image_provider: Arc<dyn ImageProvider>,
        video_provider: Arc<dyn VideoProvider>,
    ) -> Result<Self, AppError> {
        let media = MediaNormalizer::new(config.huggingface.request_timeout)
            .map_err(provider_init_error)?;

        Ok(Self {
            config,
            image_provider,
            video_provider,
            media,
        })
    }

    /// Build state with the providers selected by configuration.
    pub fn from_config(config: MediagenConfig) -> Result<Self, AppError> {
        let (image_provider, video_provider): (Arc<dyn ImageProvider>, Arc<dyn VideoProvider>) =
            match config.provider {
                ProviderKind::HuggingFace => {
                    let provider = Arc::new(
                        HuggingFaceProvider::new(&config.huggingface)
                            .map_err(provider_init_error)?,
                    );
                    tracing::info!(
                        base_url = %config.huggingface.base_url,
                        image_model = %config.huggingface.image_model,
                        "Initialized Hugging Face provider"
                    );
                    let image: Arc<dyn ImageProvider> = provider.clone();
                    let video: Arc<dyn VideoProvider> = provider;
                    (image, video)
                }
                ProviderKind::Mock => {
                    tracing::info!("Using mock generation provider");
                    let provider = Arc::new(MockProvider::new(true));
                    let image: Arc<dyn ImageProvider> = provider.clone();
                    let video: Arc<dyn VideoProvider> = provider;
                    (image, video)
                }
            };

        if !config.huggingface.token_configured() {
            tracing::warn!("HF_TOKEN is not set; generation requests will fail until it is");
        }

        Self::new(config, image_provider, video_provider)
    }
}

fn provider_init_error(e: ProviderError) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("Failed to initialize provider: {}", e))
}

/// Build the HTTP router with all middleware attached.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/generate", post(generate_image))
        .route("/generate-video", post(generate_video))
        .route_layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware));

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS is off unless origins are configured; `*` allows any origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return Some(base.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(base.allow_origin(AllowOrigin::list(allowed)))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: MediagenConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::with_state(state).await
    }

    /// Build around prepared state, e.g. with injected providers.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let addr: SocketAddr = format!("{}:{}", state.config.common.host, state.config.common.port)
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid listen address: {}", e)))?;

        // Port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("mediagen-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
