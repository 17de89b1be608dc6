//! Classifier configuration.

use std::path::{Path, PathBuf};

use silvertone_settings::EmotionSettings;

/// Exported sequence-classification graph.
pub const MODEL_FILE: &str = "model.onnx";
/// Tokenizer saved alongside the checkpoint.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Checkpoint config carrying `id2label`.
pub const CONFIG_FILE: &str = "config.json";

/// Configuration for [`OnnxEmotionClassifier`](crate::OnnxEmotionClassifier).
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    /// Directory holding the three model files.
    pub model_dir: PathBuf,
    /// Token limit; longer inputs are truncated.
    pub max_length: usize,
    /// Whether to feed a zeroed `token_type_ids` input.
    pub token_type_ids: bool,
    /// Intra-op threads for the session.
    pub intra_threads: usize,
}

impl ClassifierConfig {
    /// Create config from settings.
    pub fn from_settings(s: &EmotionSettings) -> Self {
        Self {
            model_dir: PathBuf::from(&s.model_dir),
            max_length: s.max_length,
            token_type_ids: s.token_type_ids,
            intra_threads: s.intra_threads,
        }
    }

    /// Path of the ONNX graph.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    /// Path of the tokenizer.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(TOKENIZER_FILE)
    }

    /// Path of the checkpoint config.
    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(CONFIG_FILE)
    }

    /// First required file that does not exist, if any.
    pub fn missing_file(&self) -> Option<PathBuf> {
        [self.model_path(), self.tokenizer_path(), self.config_path()]
            .into_iter()
            .find(|p| !Path::is_file(p))
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from_settings(&EmotionSettings::default())
    }
}
