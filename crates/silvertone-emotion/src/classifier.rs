//! Emotion classifier trait.

use async_trait::async_trait;

use crate::errors::Result;
use crate::ranking::Prediction;

/// Text classifier returning every label ranked by score.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify one utterance. The first element is the top prediction.
    async fn classify(&self, text: String) -> Result<Vec<Prediction>>;
}
