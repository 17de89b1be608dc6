//! ONNX Runtime sequence classifier.
//!
//! Tokenizes with `tokenizers`, runs the exported graph via `ort`, then
//! applies softmax over the logits and ranks by probability.

use std::sync::Arc;

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::classifier::EmotionClassifier;
use crate::config::ClassifierConfig;
use crate::errors::{EmotionError, Result};
use crate::labels::LabelMap;
use crate::ranking::{Prediction, rank};

/// Emotion classifier backed by a fine-tuned encoder exported to ONNX.
///
/// Cloning shares the loaded session.
#[derive(Clone)]
pub struct OnnxEmotionClassifier {
    inner: Arc<Inner>,
}

struct Inner {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: LabelMap,
    config: ClassifierConfig,
}

impl OnnxEmotionClassifier {
    /// Load model, tokenizer and labels. Runs on a blocking thread.
    pub async fn load(config: ClassifierConfig) -> Result<Self> {
        let inner = tokio::task::spawn_blocking(move || Inner::load(config))
            .await
            .map_err(|e| EmotionError::ModelInit(format!("join error: {e}")))??;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Class labels in index order.
    pub fn labels(&self) -> &LabelMap {
        &self.inner.labels
    }
}

impl Inner {
    fn load(config: ClassifierConfig) -> Result<Self> {
        if let Some(missing) = config.missing_file() {
            return Err(EmotionError::ModelInit(format!(
                "missing {}",
                missing.display()
            )));
        }
        info!(model_dir = %config.model_dir.display(), "loading emotion model");

        let labels = LabelMap::load(&config.config_path())?;

        let mut tokenizer = Tokenizer::from_file(config.tokenizer_path())
            .map_err(|e| EmotionError::Tokenizer(format!("tokenizer load: {e}")))?;
        let _ = tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| EmotionError::Tokenizer(format!("truncation: {e}")))?;
        let _ = tokenizer.with_padding(None);

        let session = Session::builder()
            .map_err(|e| EmotionError::ModelInit(format!("session builder: {e}")))?
            .with_intra_threads(config.intra_threads.max(1))
            .map_err(|e| EmotionError::ModelInit(format!("thread config: {e}")))?
            .commit_from_file(config.model_path())
            .map_err(|e| EmotionError::ModelInit(format!("model load: {e}")))?;

        info!(labels = labels.len(), "emotion classifier ready");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            config,
        })
    }

    fn classify(&self, text: &str) -> Result<Vec<Prediction>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmotionError::Tokenizer(format!("encode: {e}")))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&v| i64::from(v)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&v| i64::from(v))
            .collect();
        #[allow(clippy::cast_possible_wrap)]
        let shape = vec![1i64, ids.len() as i64];

        let input_ids = Tensor::from_array((shape.clone(), ids))
            .map_err(|e| EmotionError::Inference(format!("input_ids tensor: {e}")))?;
        let attention_mask = Tensor::from_array((shape.clone(), mask))
            .map_err(|e| EmotionError::Inference(format!("attention_mask tensor: {e}")))?;

        let mut inputs = ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
        ];
        if self.config.token_type_ids {
            let type_ids: Vec<i64> = encoding
                .get_type_ids()
                .iter()
                .map(|&v| i64::from(v))
                .collect();
            let token_type_ids = Tensor::from_array((shape, type_ids))
                .map_err(|e| EmotionError::Inference(format!("token_type_ids tensor: {e}")))?;
            inputs.push(("token_type_ids".into(), token_type_ids.into()));
        }

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| EmotionError::Inference(format!("inference: {e}")))?;

        // logits: [1, num_labels]
        let (logits_shape, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmotionError::Inference(format!("extract logits: {e}")))?;
        if logits.len() != self.labels.len() {
            return Err(EmotionError::Inference(format!(
                "logits shape {logits_shape:?} does not match {} labels",
                self.labels.len()
            )));
        }

        let ranked = rank(logits, self.labels.as_slice());
        debug!(
            tokens = encoding.len(),
            top = ranked.first().map(|p| p.label.as_str()),
            "classified"
        );
        Ok(ranked)
    }
}

#[async_trait]
impl EmotionClassifier for OnnxEmotionClassifier {
    async fn classify(&self, text: String) -> Result<Vec<Prediction>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.classify(&text))
            .await
            .map_err(|e| EmotionError::Inference(format!("join error: {e}")))?
    }
}
