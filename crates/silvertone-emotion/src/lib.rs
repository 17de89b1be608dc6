//! # silvertone-emotion
//!
//! `ONNX`-based text emotion classification.
//!
//! Loads a fine-tuned sequence-classification checkpoint exported to ONNX:
//! - Tokenize (truncated to the model's max length) -> inference -> logits
//! - Softmax over classes, ranked by probability
//! - Label names from the checkpoint's `id2label`

#![deny(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod errors;
pub mod labels;
pub mod onnx;
pub mod ranking;

pub use classifier::EmotionClassifier;
pub use config::ClassifierConfig;
pub use errors::{EmotionError, Result};
pub use labels::LabelMap;
pub use onnx::OnnxEmotionClassifier;
pub use ranking::Prediction;
