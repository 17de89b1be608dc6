//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

use crate::server::Variant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// `"asr"` or `"emotion"`.
    pub service: &'static str,
    /// `"model"` or `"dummy"`.
    pub variant: Variant,
    /// Whether a model is bound.
    pub model_loaded: bool,
    /// Why no model is bound, when a model-backed service has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Build a health response for the running service.
pub fn health_check(
    start_time: Instant,
    service: &'static str,
    variant: Variant,
    model_loaded: bool,
    unavailable_reason: Option<String>,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        service,
        variant,
        model_loaded,
        unavailable_reason,
        uptime_secs: start_time.elapsed().as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), "asr", Variant::Dummy, false, None);
        assert_eq!(resp.status, "ok");
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        let resp = health_check(start, "emotion", Variant::Model, true, None);
        assert!(resp.uptime_secs >= 59);
    }

    #[test]
    fn serialization() {
        let resp = health_check(Instant::now(), "emotion", Variant::Model, true, None);
        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["service"], "emotion");
        assert_eq!(parsed["variant"], "model");
        assert_eq!(parsed["model_loaded"], true);
        assert!(parsed["uptime_secs"].is_number());
        assert!(parsed.get("unavailable_reason").is_none());
    }

    #[test]
    fn unbound_model_reports_reason() {
        let resp = health_check(
            Instant::now(),
            "asr",
            Variant::Model,
            false,
            Some("encoder_model.onnx missing".into()),
        );
        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["model_loaded"], false);
        assert_eq!(parsed["unavailable_reason"], "encoder_model.onnx missing");
    }
}
