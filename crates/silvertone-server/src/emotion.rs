//! `POST /emotion/analyze`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use silvertone_emotion::EmotionClassifier;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::metrics::{self, Outcome};
use crate::provider::ProviderSlot;
use crate::server::Variant;

/// Metric and log label.
pub const SERVICE_NAME: &str = "emotion";
/// Fixed label returned by the stand-in service.
pub const DUMMY_EMOTION: &str = "기쁨";

/// Request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRequest {
    /// Utterance to classify; may be empty.
    #[serde(default)]
    pub text: String,
}

/// Successful classification body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionResponse {
    /// Predicted label.
    pub emotion: String,
}

/// Classification behind the HTTP handler.
#[async_trait]
pub trait EmotionService: Send + Sync {
    /// Real or stand-in.
    fn variant(&self) -> Variant;
    /// Whether a model is bound.
    fn model_loaded(&self) -> bool;
    /// Why no model is bound; `None` when loaded or not model-backed.
    fn unavailable_reason(&self) -> Option<String> {
        None
    }
    /// Classify one utterance.
    async fn analyze(&self, text: String) -> Result<EmotionResponse, ApiError>;
}

/// Classification backed by a loaded classifier.
pub struct ModelEmotionService {
    classifier: ProviderSlot<dyn EmotionClassifier>,
    neutral_label: String,
}

impl ModelEmotionService {
    /// Wrap a provider slot. `neutral_label` answers empty input.
    pub fn new(
        classifier: ProviderSlot<dyn EmotionClassifier>,
        neutral_label: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            neutral_label: neutral_label.into(),
        }
    }
}

#[async_trait]
impl EmotionService for ModelEmotionService {
    fn variant(&self) -> Variant {
        Variant::Model
    }

    fn model_loaded(&self) -> bool {
        self.classifier.is_ready()
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.classifier.reason().map(str::to_string)
    }

    async fn analyze(&self, text: String) -> Result<EmotionResponse, ApiError> {
        let Some(classifier) = self.classifier.get() else {
            warn!(reason = ?self.classifier.reason(), "emotion requested without a model");
            return Err(ApiError::ModelNotLoaded { model: "emotion" });
        };

        if text.is_empty() {
            return Ok(EmotionResponse {
                emotion: self.neutral_label.clone(),
            });
        }

        let predictions = classifier.classify(text).await.map_err(|e| {
            error!(error = %e, "emotion classification failed");
            ApiError::Inference(e.to_string())
        })?;

        let top = predictions.into_iter().next().ok_or_else(|| {
            error!("classifier returned no predictions");
            ApiError::Inference("classifier returned no predictions".into())
        })?;

        info!(emotion = %top.label, score = top.score, "emotion result");
        Ok(EmotionResponse { emotion: top.label })
    }
}

/// Stand-in that never loads a model.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyEmotionService;

#[async_trait]
impl EmotionService for DummyEmotionService {
    fn variant(&self) -> Variant {
        Variant::Dummy
    }

    fn model_loaded(&self) -> bool {
        false
    }

    async fn analyze(&self, text: String) -> Result<EmotionResponse, ApiError> {
        info!(text = %text, "received text");
        info!(emotion = DUMMY_EMOTION, "returning emotion");
        Ok(EmotionResponse {
            emotion: DUMMY_EMOTION.to_string(),
        })
    }
}

/// POST /emotion/analyze
pub async fn analyze_handler(
    State(service): State<Arc<dyn EmotionService>>,
    body: Result<Json<EmotionRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result: Result<EmotionResponse, ApiError> = async {
        let Json(request) = body?;
        service.analyze(request.text).await
    }
    .await;

    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    };
    metrics::record_request(
        SERVICE_NAME,
        Outcome::from_status(response.status()),
        started.elapsed(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use silvertone_emotion::{EmotionError, Prediction};

    struct Fixed(Vec<Prediction>);

    #[async_trait]
    impl EmotionClassifier for Fixed {
        async fn classify(&self, _text: String) -> silvertone_emotion::Result<Vec<Prediction>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl EmotionClassifier for Failing {
        async fn classify(&self, _text: String) -> silvertone_emotion::Result<Vec<Prediction>> {
            Err(EmotionError::Inference("session poisoned".into()))
        }
    }

    fn prediction(label: &str, score: f32) -> Prediction {
        Prediction {
            label: label.into(),
            score,
        }
    }

    #[tokio::test]
    async fn takes_first_label() {
        let service = ModelEmotionService::new(
            ProviderSlot::ready(Arc::new(Fixed(vec![
                prediction("슬픔", 0.7),
                prediction("기쁨", 0.2),
            ]))),
            "중립",
        );
        let resp = service.analyze("비가 와요".into()).await.unwrap();
        assert_eq!(resp.emotion, "슬픔");
    }

    #[tokio::test]
    async fn empty_text_is_neutral() {
        let service = ModelEmotionService::new(ProviderSlot::ready(Arc::new(Failing)), "중립");
        let resp = service.analyze(String::new()).await.unwrap();
        assert_eq!(resp.emotion, "중립");
    }

    #[tokio::test]
    async fn whitespace_is_not_empty() {
        let service = ModelEmotionService::new(
            ProviderSlot::ready(Arc::new(Fixed(vec![prediction("기쁨", 1.0)]))),
            "중립",
        );
        let resp = service.analyze(" ".into()).await.unwrap();
        assert_eq!(resp.emotion, "기쁨");
    }

    #[tokio::test]
    async fn unbound_checked_before_empty_shortcut() {
        let service = ModelEmotionService::new(ProviderSlot::unavailable("test"), "중립");
        let err = service.analyze(String::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "emotion model is not loaded");
        assert_eq!(service.unavailable_reason().as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn provider_error_is_inference() {
        let service = ModelEmotionService::new(ProviderSlot::ready(Arc::new(Failing)), "중립");
        let err = service.analyze("hi".into()).await.unwrap_err();
        assert_matches!(err, ApiError::Inference(_));
        assert!(err.to_string().contains("session poisoned"));
    }

    #[tokio::test]
    async fn empty_prediction_list_is_inference() {
        let service = ModelEmotionService::new(ProviderSlot::ready(Arc::new(Fixed(vec![]))), "중립");
        let err = service.analyze("hi".into()).await.unwrap_err();
        assert_matches!(err, ApiError::Inference(_));
    }

    #[tokio::test]
    async fn dummy_always_joy() {
        for text in ["", "슬퍼요", "화나요"] {
            let resp = DummyEmotionService.analyze(text.into()).await.unwrap();
            assert_eq!(resp.emotion, DUMMY_EMOTION);
        }
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let req: EmotionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.text, "");
    }
}
