//! One-time model loading at process start.
//!
//! Failures are logged with their full source chain and returned; the binary
//! exits instead of serving without a model.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

use silvertone_emotion::{ClassifierConfig, EmotionError, OnnxEmotionClassifier};
use silvertone_settings::{AsrSettings, EmotionSettings};
use silvertone_transcription::{TranscriptionError, WhisperConfig, WhisperEngine};
use tracing::{error, info};

use crate::asr::ModelTranscriptionService;
use crate::emotion::ModelEmotionService;
use crate::provider::ProviderSlot;

/// Model construction failed.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Speech recognizer could not be loaded.
    #[error("failed to load transcription model from {dir}")]
    Transcription {
        /// Model directory that was tried.
        dir: PathBuf,
        /// Underlying failure.
        #[source]
        source: TranscriptionError,
    },
    /// Emotion classifier could not be loaded.
    #[error("failed to load emotion model from {dir}")]
    Emotion {
        /// Model directory that was tried.
        dir: PathBuf,
        /// Underlying failure.
        #[source]
        source: EmotionError,
    },
}

/// Map settings to the engine configuration.
pub fn whisper_config(settings: &AsrSettings) -> WhisperConfig {
    WhisperConfig {
        model_dir: PathBuf::from(&settings.model_dir),
        tokenizer: settings.tokenizer.clone(),
        language: settings.language.clone(),
        chunk_length_secs: settings.chunk_length_secs,
        max_new_tokens: settings.max_new_tokens,
        intra_threads: settings.intra_threads,
    }
}

/// Load the speech recognizer and wrap it in a service.
pub async fn load_transcription_service(
    settings: &AsrSettings,
) -> Result<ModelTranscriptionService, BootstrapError> {
    let config = whisper_config(settings);
    let dir = config.model_dir.clone();
    info!(
        model_dir = %dir.display(),
        tokenizer = %settings.tokenizer,
        device = %settings.device,
        "loading transcription model"
    );

    match WhisperEngine::load(config).await {
        Ok(engine) => {
            info!(model_dir = %dir.display(), "transcription model loaded");
            Ok(ModelTranscriptionService::new(ProviderSlot::ready(Arc::new(engine))))
        }
        Err(source) => {
            let err = BootstrapError::Transcription { dir, source };
            error!(error = %err, chain = %error_chain(&err), "transcription model failed to load");
            Err(err)
        }
    }
}

/// Load the emotion classifier and wrap it in a service.
pub async fn load_emotion_service(
    settings: &EmotionSettings,
) -> Result<ModelEmotionService, BootstrapError> {
    let config = ClassifierConfig::from_settings(settings);
    let dir = config.model_dir.clone();
    info!(
        model_dir = %dir.display(),
        device = %settings.device,
        "loading emotion model"
    );

    match OnnxEmotionClassifier::load(config).await {
        Ok(classifier) => {
            info!(labels = classifier.labels().len(), "emotion model loaded");
            Ok(ModelEmotionService::new(
                ProviderSlot::ready(Arc::new(classifier)),
                settings.neutral_label.clone(),
            ))
        }
        Err(source) => {
            let err = BootstrapError::Emotion { dir, source };
            error!(error = %err, chain = %error_chain(&err), "emotion model failed to load");
            Err(err)
        }
    }
}

/// `outer: inner: innermost` rendering of an error and its sources.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
