//! Speech recognition on ONNX Runtime with a fine-tuned Whisper model.
//!
//! # Architecture
//!
//! ```text
//! upload bytes → symphonia decode → rubato resample to 16kHz mono f32
//! → split into ≤30 s segments
//! → log-mel features [1, 80, 3000]
//! → encoder_model.onnx → hidden states [1, 1500, d_model]
//! → greedy decode (decoder_model.onnx in loop) → token IDs
//! → tokenizer.json decode → segment text, joined with spaces
//! ```

pub mod audio;
pub mod decoder;
pub mod engine;
pub mod mel;
pub mod model;
pub mod recognizer;
pub mod types;

pub use audio::{MediaHint, TARGET_SAMPLE_RATE, decode_audio};
pub use engine::{WhisperConfig, WhisperEngine};
pub use recognizer::SpeechRecognizer;
pub use types::{AudioBuffer, Transcript, TranscriptionError};
