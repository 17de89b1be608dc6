//! Recognizer seam between the HTTP layer and the model.

use async_trait::async_trait;

use crate::types::{AudioBuffer, Transcript, TranscriptionError};

/// Something that turns decoded 16 kHz audio into text.
///
/// Implemented by [`WhisperEngine`](crate::WhisperEngine); tests substitute
/// their own implementations.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one recording.
    async fn recognize(&self, audio: AudioBuffer) -> Result<Transcript, TranscriptionError>;
}
