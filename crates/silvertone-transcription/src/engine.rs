//! ONNX session management and inference pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ort::session::Session;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::audio;
use crate::decoder::{self, PromptTokens};
use crate::mel::LogMelExtractor;
use crate::model::{self, ModelPaths};
use crate::recognizer::SpeechRecognizer;
use crate::types::{AudioBuffer, ResultExt, Transcript, TranscriptionError};

/// Decoder is sequential; single thread is sufficient.
const DECODER_THREADS: usize = 1;

/// Everything needed to load and run the recognizer.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Directory holding `encoder_model.onnx` and `decoder_model.onnx`.
    pub model_dir: PathBuf,
    /// Hub repository or file path for `tokenizer.json`.
    pub tokenizer: String,
    /// Language code forced into the prompt.
    pub language: String,
    /// Segment length in seconds (at most 30).
    pub chunk_length_secs: u32,
    /// Generated token budget per segment.
    pub max_new_tokens: usize,
    /// Intra-op threads for the encoder session.
    pub intra_threads: usize,
}

/// Whisper recognizer on ONNX Runtime.
///
/// Sessions sit behind a mutex since `Session::run` requires `&mut self`.
/// All inference runs on `spawn_blocking` to keep the async runtime free.
/// Cloning is cheap and shares the loaded sessions.
#[derive(Clone)]
pub struct WhisperEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    prompt: PromptTokens,
    mel: LogMelExtractor,
    config: WhisperConfig,
}

impl WhisperEngine {
    /// Load sessions and tokenizer. CPU and disk heavy; call once at startup.
    pub async fn load(config: WhisperConfig) -> Result<Self, TranscriptionError> {
        let inner = tokio::task::spawn_blocking(move || EngineInner::load(config))
            .await
            .inference("task join")??;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

impl EngineInner {
    fn load(config: WhisperConfig) -> Result<Self, TranscriptionError> {
        info!(
            model_dir = %config.model_dir.display(),
            "loading speech recognition model"
        );
        let paths = ModelPaths::from_dir(&config.model_dir)?;

        let encoder = Session::builder()
            .inference("session builder")?
            .with_intra_threads(config.intra_threads.max(1))
            .inference("set threads")?
            .commit_from_file(&paths.encoder)
            .inference("load encoder")?;
        debug!("loaded encoder");

        let decoder = Session::builder()
            .inference("session builder")?
            .with_intra_threads(DECODER_THREADS)
            .inference("set threads")?
            .commit_from_file(&paths.decoder)
            .inference("load decoder")?;
        debug!("loaded decoder");

        let tokenizer_path = model::resolve_tokenizer(&config.model_dir, &config.tokenizer)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).tokenizer("load tokenizer")?;
        let prompt = PromptTokens::from_tokenizer(&tokenizer, &config.language)?;

        info!(
            language = %config.language,
            chunk_secs = config.chunk_length_secs,
            "speech recognition engine ready"
        );

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            prompt,
            mel: LogMelExtractor::new(),
            config,
        })
    }

    /// Run the full pipeline over every segment (CPU-bound, blocking thread only).
    fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, TranscriptionError> {
        let mut pieces = Vec::new();
        let mut chunks = 0;

        for segment in audio::split_chunks(&audio.samples, self.config.chunk_length_secs) {
            chunks += 1;
            let features = self.mel.compute(segment)?;

            let hidden = {
                let mut encoder = self.encoder.lock();
                decoder::run_encoder(&mut encoder, features)?
            };

            let ids = {
                let mut decoder_session = self.decoder.lock();
                decoder::greedy_decode(
                    &mut decoder_session,
                    &hidden,
                    &self.prompt,
                    self.config.max_new_tokens,
                )?
            };

            let text = decoder::detokenize(&self.tokenizer, &ids)?;
            debug!(chunk = chunks, chars = text.len(), "segment transcribed");
            if !text.is_empty() {
                pieces.push(text);
            }
        }

        Ok(Transcript {
            text: pieces.join(" "),
            duration_seconds: audio.duration_seconds(),
            chunks,
        })
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperEngine {
    async fn recognize(&self, audio: AudioBuffer) -> Result<Transcript, TranscriptionError> {
        debug!(
            seconds = audio.duration_seconds(),
            source_rate = audio.source_rate,
            "transcribing"
        );
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.transcribe(&audio))
            .await
            .inference("inference task")?
    }
}
