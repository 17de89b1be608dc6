//! Encoder pass and greedy autoregressive decoding for Whisper graphs.
//!
//! ONNX tensor shapes use `i64` dimensions while Rust indexing needs `usize`.
//! These casts are safe because tensor dimensions are always small positive values.
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::mel::{N_FRAMES, N_MELS};
use crate::types::{ResultExt, TranscriptionError};

/// Forced decoder prefix: start, language, task, no timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTokens {
    /// Prefix fed before the first generated token.
    pub prefix: Vec<u32>,
    /// `<|endoftext|>`; generation stops when it is produced.
    pub end_of_text: u32,
}

impl PromptTokens {
    /// Look up the special tokens for `language` (e.g. `"ko"`).
    pub fn from_tokenizer(tokenizer: &Tokenizer, language: &str) -> Result<Self, TranscriptionError> {
        let id = |token: &str| {
            tokenizer.token_to_id(token).ok_or_else(|| {
                TranscriptionError::Tokenizer(format!("special token {token} not in vocabulary"))
            })
        };
        Ok(Self {
            prefix: vec![
                id("<|startoftranscript|>")?,
                id(&format!("<|{language}|>"))?,
                id("<|transcribe|>")?,
                id("<|notimestamps|>")?,
            ],
            end_of_text: id("<|endoftext|>")?,
        })
    }
}

/// Encoder hidden states `[1, frames, d_model]`.
pub struct EncoderOutput {
    shape: Vec<i64>,
    data: Vec<f32>,
}

/// Run the encoder on `[1, 80, 3000]` log-mel features.
pub fn run_encoder(encoder: &mut Session, mel: Vec<f32>) -> Result<EncoderOutput, TranscriptionError> {
    let features = Tensor::from_array(([1i64, N_MELS as i64, N_FRAMES as i64], mel))
        .inference("encoder input_features tensor")?;

    let outputs = encoder
        .run(ort::inputs!["input_features" => features])
        .inference("encoder run")?;

    let (shape, data) = outputs["last_hidden_state"]
        .try_extract_tensor::<f32>()
        .inference("extract last_hidden_state")?;

    Ok(EncoderOutput {
        shape: shape.iter().copied().collect(),
        data: data.to_vec(),
    })
}

/// Greedy decode: repeatedly feed the growing token sequence and append the
/// argmax of the last position's logits until `<|endoftext|>` or the budget.
///
/// Returns only the generated ids, without the prompt or end token.
pub fn greedy_decode(
    decoder: &mut Session,
    encoder_out: &EncoderOutput,
    prompt: &PromptTokens,
    max_new_tokens: usize,
) -> Result<Vec<u32>, TranscriptionError> {
    let hidden = Tensor::from_array((encoder_out.shape.clone(), encoder_out.data.clone()))
        .inference("encoder_hidden_states tensor")?;

    let mut tokens: Vec<u32> = prompt.prefix.clone();
    let mut generated = Vec::new();

    for _ in 0..max_new_tokens {
        let ids: Vec<i64> = tokens.iter().map(|&t| i64::from(t)).collect();
        let input_ids =
            Tensor::from_array(([1i64, ids.len() as i64], ids)).inference("input_ids tensor")?;

        let outputs = decoder
            .run(ort::inputs![
                "input_ids" => input_ids,
                "encoder_hidden_states" => &hidden,
            ])
            .inference("decoder run")?;

        // logits: [1, seq_len, vocab]
        let (shape, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .inference("extract logits")?;
        let vocab = shape.last().copied().unwrap_or_default() as usize;
        if vocab == 0 || logits.len() < vocab {
            return Err(TranscriptionError::Inference(format!(
                "unexpected logits shape {shape:?}"
            )));
        }

        let next = argmax(&logits[logits.len() - vocab..]) as u32;
        if next == prompt.end_of_text {
            break;
        }
        tokens.push(next);
        generated.push(next);
    }

    debug!(
        generated = generated.len(),
        budget = max_new_tokens,
        "greedy decode finished"
    );
    Ok(generated)
}

/// Turn generated ids into text, dropping special tokens.
pub fn detokenize(tokenizer: &Tokenizer, ids: &[u32]) -> Result<String, TranscriptionError> {
    let text = tokenizer.decode(ids, true).tokenizer("decode")?;
    Ok(text.trim().to_string())
}

/// Find the index of the maximum value in a slice.
fn argmax(slice: &[f32]) -> usize {
    slice
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}
