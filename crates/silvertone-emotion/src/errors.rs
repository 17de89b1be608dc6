//! Emotion classification error types.

use thiserror::Error;

/// Errors from loading or running the classifier.
#[derive(Debug, Error)]
pub enum EmotionError {
    /// Model files missing or the session could not be created.
    #[error("model initialization failed: {0}")]
    ModelInit(String),

    /// Tokenizer load or encode failure.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Inference failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// `config.json` is missing labels or malformed.
    #[error("config error: {0}")]
    Config(String),

    /// Reading model files failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing `config.json` failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for classifier operations.
pub type Result<T> = std::result::Result<T, EmotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let cases = vec![
            (
                EmotionError::ModelInit("ort failed".into()),
                "model initialization failed: ort failed",
            ),
            (
                EmotionError::Inference("bad shape".into()),
                "inference failed: bad shape",
            ),
            (
                EmotionError::Config("no id2label".into()),
                "config error: no id2label",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmotionError>();
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EmotionError = json_err.into();
        assert!(err.to_string().starts_with("json error:"));
    }
}
