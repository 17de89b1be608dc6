//! `InferenceServer`: Axum HTTP server hosting one inference endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::asr::{self, TranscriptionService};
use crate::config::ServerConfig;
use crate::emotion::{self, EmotionService};
use crate::health::{self, HealthResponse};
use crate::metrics;
use crate::shutdown::ShutdownCoordinator;

/// Whether a service runs a model or returns fixed output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Model-backed.
    Model,
    /// Stand-in returning a fixed response.
    Dummy,
}

/// The one service this process exposes.
#[derive(Clone)]
pub enum Endpoint {
    /// `POST /asr/transcribe`.
    Asr(Arc<dyn TranscriptionService>),
    /// `POST /emotion/analyze`.
    Emotion(Arc<dyn EmotionService>),
}

impl Endpoint {
    /// Service label for logs, metrics and `/health`.
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Asr(_) => asr::SERVICE_NAME,
            Self::Emotion(_) => emotion::SERVICE_NAME,
        }
    }

    /// Variant of the wrapped service.
    pub fn variant(&self) -> Variant {
        match self {
            Self::Asr(svc) => svc.variant(),
            Self::Emotion(svc) => svc.variant(),
        }
    }

    /// Whether the wrapped service has a model bound.
    pub fn model_loaded(&self) -> bool {
        match self {
            Self::Asr(svc) => svc.model_loaded(),
            Self::Emotion(svc) => svc.model_loaded(),
        }
    }

    /// Why the wrapped service has no model, if it is model-backed and unbound.
    pub fn unavailable_reason(&self) -> Option<String> {
        match self {
            Self::Asr(svc) => svc.unavailable_reason(),
            Self::Emotion(svc) => svc.unavailable_reason(),
        }
    }

    fn routes(&self) -> Router {
        match self {
            Self::Asr(svc) => Router::new()
                .route("/asr/transcribe", post(asr::transcribe_handler))
                .with_state(Arc::clone(svc)),
            Self::Emotion(svc) => Router::new()
                .route("/emotion/analyze", post(emotion::analyze_handler))
                .with_state(Arc::clone(svc)),
        }
    }
}

/// Shared state for the operational routes.
#[derive(Clone)]
struct OpsState {
    endpoint: Endpoint,
    start_time: Instant,
}

/// HTTP server for one inference service.
pub struct InferenceServer {
    config: ServerConfig,
    endpoint: Endpoint,
    metrics: Option<PrometheusHandle>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl InferenceServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, endpoint: Endpoint) -> Self {
        Self {
            config,
            endpoint,
            metrics: None,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Expose `/metrics` from this recorder handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let ops = OpsState {
            endpoint: self.endpoint.clone(),
            start_time: self.start_time,
        };

        let mut router = self
            .endpoint
            .routes()
            .merge(Router::new().route("/health", get(health_handler)).with_state(ops));

        if let Some(handle) = self.metrics.clone() {
            router = router.route(
                "/metrics",
                get(move || async move { metrics::render(&handle) }),
            );
        }

        router
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until the shutdown coordinator is cancelled.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let router = self.router();
        let token = self.shutdown.token();
        info!(
            addr = %listener.local_addr()?,
            service = self.endpoint.service_name(),
            variant = ?self.endpoint.variant(),
            model_loaded = self.endpoint.model_loaded(),
            "server listening"
        );
        axum::serve(listener, router)
            .with_graceful_shutdown(token.cancelled_owned())
            .await?;
        info!("server stopped");
        Ok(())
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the hosted endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// GET /health
async fn health_handler(State(state): State<OpsState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.endpoint.service_name(),
        state.endpoint.variant(),
        state.endpoint.model_loaded(),
        state.endpoint.unavailable_reason(),
    ))
}
