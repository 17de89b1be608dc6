//! Model file management: path resolution and tokenizer download from `HuggingFace`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::types::TranscriptionError;

/// Encoder graph exported from the fine-tuned checkpoint.
pub const ENCODER_FILE: &str = "encoder_model.onnx";
/// Decoder graph (no KV cache) exported from the fine-tuned checkpoint.
pub const DECODER_FILE: &str = "decoder_model.onnx";
/// Tokenizer file looked up in the model directory before the hub.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Resolved locations of the ONNX graphs.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Encoder graph.
    pub encoder: PathBuf,
    /// Decoder graph.
    pub decoder: PathBuf,
}

impl ModelPaths {
    /// Paths under `model_dir`, failing if either graph is missing.
    pub fn from_dir(model_dir: &Path) -> Result<Self, TranscriptionError> {
        if !model_dir.is_dir() {
            return Err(TranscriptionError::ModelNotAvailable(format!(
                "model directory not found: {}",
                model_dir.display()
            )));
        }
        let paths = Self {
            encoder: model_dir.join(ENCODER_FILE),
            decoder: model_dir.join(DECODER_FILE),
        };
        for file in [&paths.encoder, &paths.decoder] {
            if !file.is_file() {
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "missing {}",
                    file.display()
                )));
            }
        }
        Ok(paths)
    }
}

/// Locate `tokenizer.json`: the model directory first, then the hub repo.
///
/// `source` may also be a direct path to a tokenizer file.
pub fn resolve_tokenizer(model_dir: &Path, source: &str) -> Result<PathBuf, TranscriptionError> {
    let local = model_dir.join(TOKENIZER_FILE);
    if local.is_file() {
        debug!(path = %local.display(), "using bundled tokenizer");
        return Ok(local);
    }

    let direct = Path::new(source);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    info!(repo = source, "fetching tokenizer from HuggingFace");
    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| TranscriptionError::ModelNotAvailable(format!("HF API init: {e}")))?;
    api.model(source.to_string())
        .get(TOKENIZER_FILE)
        .map_err(|e| {
            TranscriptionError::ModelNotAvailable(format!(
                "download failed for {source}/{TOKENIZER_FILE}: {e}"
            ))
        })
}
