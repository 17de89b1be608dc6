//! Core types for the speech recognition pipeline.

use std::fmt::Display;

/// Result of transcribing one uploaded recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Recognized text, chunk results joined by a single space.
    pub text: String,
    /// Duration of the decoded audio in seconds.
    pub duration_seconds: f64,
    /// Number of fixed-length segments the audio was split into.
    pub chunks: usize,
}

/// Decoded mono waveform at [`TARGET_SAMPLE_RATE`](crate::audio::TARGET_SAMPLE_RATE).
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    /// Mono samples in `[-1.0, 1.0]` at 16 kHz.
    pub samples: Vec<f32>,
    /// Sample rate of the container before resampling.
    pub source_rate: u32,
}

impl AudioBuffer {
    /// Duration in seconds at the target rate.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(crate::audio::TARGET_SAMPLE_RATE)
    }
}

/// Errors that can occur during transcription.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Model files not found or failed to download.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// ONNX Runtime session creation or inference failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// Audio decoding failure (unsupported format, corrupt data).
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// Resampling failure.
    #[error("resample error: {0}")]
    Resample(String),

    /// Tokenizer load, lookup, or decode failure.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscriptionError {
    /// Whether the failure comes from the uploaded bytes rather than the model.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::AudioDecode(_) | Self::Resample(_))
    }
}

/// Attach a context label to foreign errors as [`TranscriptionError::Inference`].
pub(crate) trait ResultExt<T> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError>;
    fn tokenizer(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Inference(format!("{context}: {e}")))
    }

    fn tokenizer(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Tokenizer(format!("{context}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_fields() {
        let t = Transcript {
            text: "안녕하세요".into(),
            duration_seconds: 2.5,
            chunks: 1,
        };
        assert_eq!(t.text, "안녕하세요");
        assert_eq!(t.chunks, 1);
        assert!((t.duration_seconds - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn audio_buffer_duration() {
        let buf = AudioBuffer {
            samples: vec![0.0; 24_000],
            source_rate: 44_100,
        };
        assert!((buf.duration_seconds() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn transcription_error_display() {
        let e = TranscriptionError::ModelNotAvailable("missing encoder".into());
        assert!(e.to_string().contains("missing encoder"));

        let e = TranscriptionError::AudioDecode("corrupt header".into());
        assert_eq!(e.to_string(), "audio decode error: corrupt header");
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(TranscriptionError::AudioDecode("x".into()).is_input_error());
        assert!(TranscriptionError::Resample("x".into()).is_input_error());
        assert!(!TranscriptionError::Inference("x".into()).is_input_error());
    }

    #[test]
    fn result_ext_prefixes_context() {
        let r: Result<(), &str> = Err("boom");
        let e = r.inference("encoder run").unwrap_err();
        assert_eq!(e.to_string(), "inference error: encoder run: boom");
    }
}
