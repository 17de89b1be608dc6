//! Model artifact and inference settings for both services.

use serde::{Deserialize, Serialize};

/// Compute device a model is bound to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// ONNX Runtime CPU execution provider.
    #[default]
    Cpu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
        }
    }
}

/// Speech-to-text model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AsrSettings {
    /// Directory holding the exported encoder and decoder weights.
    pub model_dir: String,
    /// Hub repository the tokenizer is fetched from when the model
    /// directory has no `tokenizer.json`.
    pub tokenizer: String,
    /// Compute device.
    pub device: Device,
    /// Language token forced into the decoder prompt.
    pub language: String,
    /// Longest audio segment fed to the model at once, in seconds.
    pub chunk_length_secs: u32,
    /// Upper bound on generated tokens per segment.
    pub max_new_tokens: usize,
    /// Intra-op threads for the encoder session.
    pub intra_threads: usize,
}

impl Default for AsrSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/stt_model".to_string(),
            tokenizer: "openai/whisper-large-v2".to_string(),
            device: Device::Cpu,
            language: "ko".to_string(),
            chunk_length_secs: 30,
            max_new_tokens: 224,
            intra_threads: 4,
        }
    }
}

/// Emotion classification model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmotionSettings {
    /// Directory holding `model.onnx`, `tokenizer.json` and `config.json`.
    pub model_dir: String,
    /// Compute device.
    pub device: Device,
    /// Token limit; longer inputs are truncated.
    pub max_length: usize,
    /// Label returned for empty input without running the model.
    pub neutral_label: String,
    /// Whether the exported graph takes a `token_type_ids` input.
    pub token_type_ids: bool,
    /// Intra-op threads for the session.
    pub intra_threads: usize,
}

impl Default for EmotionSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/emotion_model".to_string(),
            device: Device::Cpu,
            max_length: 512,
            neutral_label: "중립".to_string(),
            token_type_ids: true,
            intra_threads: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asr_defaults() {
        let s = AsrSettings::default();
        assert_eq!(s.model_dir, "models/stt_model");
        assert_eq!(s.tokenizer, "openai/whisper-large-v2");
        assert_eq!(s.device, Device::Cpu);
        assert_eq!(s.chunk_length_secs, 30);
        assert_eq!(s.language, "ko");
    }

    #[test]
    fn emotion_defaults() {
        let s = EmotionSettings::default();
        assert_eq!(s.model_dir, "models/emotion_model");
        assert_eq!(s.neutral_label, "중립");
        assert_eq!(s.max_length, 512);
    }

    #[test]
    fn unknown_device_is_rejected() {
        let result = serde_json::from_str::<AsrSettings>(r#"{"device": "cuda"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
    }
}
