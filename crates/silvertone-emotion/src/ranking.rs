//! Logits to ranked predictions.

use serde::{Deserialize, Serialize};

/// One class with its probability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable class name.
    pub label: String,
    /// Softmax probability in `[0, 1]`.
    pub score: f32,
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Pair probabilities with labels, highest first. Ties keep class order.
pub fn rank(logits: &[f32], labels: &[String]) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = softmax(logits)
        .into_iter()
        .zip(labels)
        .map(|(score, label)| Prediction {
            label: label.clone(),
            score,
        })
        .collect();
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    predictions
}
