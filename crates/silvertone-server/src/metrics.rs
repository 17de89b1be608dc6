//! Prometheus metrics recorder and `/metrics` endpoint handler.

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Inference requests total (counter, labels: service, outcome).
pub const INFERENCE_REQUESTS_TOTAL: &str = "inference_requests_total";
/// Inference request duration seconds (histogram, labels: service).
pub const INFERENCE_DURATION_SECONDS: &str = "inference_duration_seconds";

/// Outcome label for a handled request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx.
    Ok,
    /// 4xx.
    ClientError,
    /// 5xx.
    ServerError,
}

impl Outcome {
    /// Classify a response status.
    pub fn from_status(status: axum::http::StatusCode) -> Self {
        if status.is_server_error() {
            Self::ServerError
        } else if status.is_client_error() {
            Self::ClientError
        } else {
            Self::Ok
        }
    }

    /// Label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
        }
    }
}

/// Count one request and record its latency.
pub fn record_request(service: &'static str, outcome: Outcome, elapsed: Duration) {
    metrics::counter!(
        INFERENCE_REQUESTS_TOTAL,
        "service" => service,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(INFERENCE_DURATION_SECONDS, "service" => service)
        .record(elapsed.as_secs_f64());
}
