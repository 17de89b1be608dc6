//! `POST /asr/transcribe`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use silvertone_transcription::{MediaHint, SpeechRecognizer, TranscriptionError, decode_audio};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::metrics::{self, Outcome};
use crate::provider::ProviderSlot;
use crate::server::Variant;

/// Metric and log label.
pub const SERVICE_NAME: &str = "asr";
/// Fixed text returned by the stand-in service.
pub const DUMMY_TRANSCRIPT: &str = "더미 인식 결과: 안녕하세요";
/// Multipart field carrying the audio.
pub const FILE_FIELD: &str = "file";

/// Successful transcription body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Recognized text; empty when nothing was recognized.
    pub text: String,
}

/// The `file` part of the upload.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    /// Raw bytes.
    pub bytes: Bytes,
    /// Client-side file name.
    pub file_name: Option<String>,
    /// Part content type.
    pub content_type: Option<String>,
}

impl AudioUpload {
    fn hint(&self) -> MediaHint {
        MediaHint {
            mime_type: self.content_type.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// Transcription behind the HTTP handler.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Real or stand-in.
    fn variant(&self) -> Variant;
    /// Whether a model is bound.
    fn model_loaded(&self) -> bool;
    /// Why no model is bound; `None` when loaded or not model-backed.
    fn unavailable_reason(&self) -> Option<String> {
        None
    }
    /// Turn an upload into text.
    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionResponse, ApiError>;
}

/// Transcription backed by a loaded recognizer.
pub struct ModelTranscriptionService {
    recognizer: ProviderSlot<dyn SpeechRecognizer>,
}

impl ModelTranscriptionService {
    /// Wrap a provider slot.
    pub fn new(recognizer: ProviderSlot<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }
}

#[async_trait]
impl TranscriptionService for ModelTranscriptionService {
    fn variant(&self) -> Variant {
        Variant::Model
    }

    fn model_loaded(&self) -> bool {
        self.recognizer.is_ready()
    }

    fn unavailable_reason(&self) -> Option<String> {
        self.recognizer.reason().map(str::to_string)
    }

    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionResponse, ApiError> {
        let Some(recognizer) = self.recognizer.get() else {
            warn!(reason = ?self.recognizer.reason(), "transcription requested without a model");
            return Err(ApiError::ModelNotLoaded {
                model: "transcription",
            });
        };

        let hint = upload.hint();
        let bytes = upload.bytes;
        let audio = tokio::task::spawn_blocking(move || decode_audio(&bytes, &hint))
            .await
            .map_err(|e| ApiError::Internal(format!("decode task: {e}")))?
            .map_err(|e| {
                warn!(error = %e, file = ?upload.file_name, "rejecting undecodable upload");
                bad_audio(e)
            })?;

        let transcript = recognizer.recognize(audio).await.map_err(|e| {
            error!(error = %e, "transcription failed");
            ApiError::Inference(e.to_string())
        })?;

        info!(
            text = %transcript.text,
            seconds = transcript.duration_seconds,
            chunks = transcript.chunks,
            "transcription result"
        );
        Ok(TranscriptionResponse {
            text: transcript.text,
        })
    }
}

/// Map a decode failure: upload faults are 400, anything else is ours.
fn bad_audio(err: TranscriptionError) -> ApiError {
    match err {
        TranscriptionError::AudioDecode(msg) => ApiError::BadAudio(msg),
        other if other.is_input_error() => ApiError::BadAudio(other.to_string()),
        other => ApiError::Internal(other.to_string()),
    }
}

/// Stand-in that never loads a model.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyTranscriptionService;

#[async_trait]
impl TranscriptionService for DummyTranscriptionService {
    fn variant(&self) -> Variant {
        Variant::Dummy
    }

    fn model_loaded(&self) -> bool {
        false
    }

    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionResponse, ApiError> {
        info!(bytes = upload.bytes.len(), "dummy transcription");
        Ok(TranscriptionResponse {
            text: DUMMY_TRANSCRIPT.to_string(),
        })
    }
}

/// Pull the `file` part out of the form, ignoring other fields.
async fn read_upload(mut multipart: Multipart) -> Result<AudioUpload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(AudioUpload {
            bytes,
            file_name,
            content_type,
        });
    }
    Err(ApiError::unprocessable(format!(
        "field required: {FILE_FIELD}"
    )))
}

/// POST /asr/transcribe
pub async fn transcribe_handler(
    State(service): State<Arc<dyn TranscriptionService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let result: Result<TranscriptionResponse, ApiError> = async {
        let upload = read_upload(multipart?).await?;
        service.transcribe(upload).await
    }
    .await;

    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    };
    metrics::record_request(
        SERVICE_NAME,
        Outcome::from_status(response.status()),
        started.elapsed(),
    );
    response
}
