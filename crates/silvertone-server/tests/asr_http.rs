//! `/asr/transcribe` driven through the router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use mockall::mock;
use serde_json::Value;
use tower::ServiceExt;

use silvertone_server::asr::DUMMY_TRANSCRIPT;
use silvertone_server::{
    DummyTranscriptionService, Endpoint, InferenceServer, ModelTranscriptionService,
    ProviderSlot, ServerConfig, TranscriptionService,
};
use silvertone_transcription::{AudioBuffer, SpeechRecognizer, Transcript, TranscriptionError};

mock! {
    pub Recognizer {}

    #[async_trait]
    impl SpeechRecognizer for Recognizer {
        async fn recognize(&self, audio: AudioBuffer) -> Result<Transcript, TranscriptionError>;
    }
}

const BOUNDARY: &str = "silvertone-test-boundary";

fn router_for(service: Arc<dyn TranscriptionService>, max_upload_bytes: usize) -> Router {
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        max_upload_bytes,
    };
    InferenceServer::new(config, Endpoint::Asr(service)).router()
}

fn model_router(recognizer: MockRecognizer) -> Router {
    let slot: ProviderSlot<dyn SpeechRecognizer> = ProviderSlot::ready(Arc::new(recognizer));
    router_for(
        Arc::new(ModelTranscriptionService::new(slot)),
        50 * 1024 * 1024,
    )
}

/// 16-bit PCM WAV of silence.
fn wav(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
    let block_align = channels * 2;
    let data_size = frames * u32::from(block_align);
    let mut buf = Vec::new();
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVEfmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    buf.resize(buf.len() + data_size as usize, 0);
    buf
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/asr/transcribe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn wav_upload(data: &[u8]) -> Request<Body> {
    upload_request(multipart_body("file", "voice.wav", "audio/wav", data))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

// ── Stand-in ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dummy_returns_fixed_text_for_audio() {
    let app = router_for(Arc::new(DummyTranscriptionService), 1 << 20);
    let (status, body) = send(app, wav_upload(&wav(16_000, 1, 1600))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "text": DUMMY_TRANSCRIPT }));
}

#[tokio::test]
async fn dummy_accepts_any_bytes() {
    let app = router_for(Arc::new(DummyTranscriptionService), 1 << 20);
    let (status, body) = send(app, wav_upload(b"definitely not audio")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "더미 인식 결과: 안녕하세요");
}

#[tokio::test]
async fn dummy_still_requires_file_field() {
    let app = router_for(Arc::new(DummyTranscriptionService), 1 << 20);
    let req = upload_request(multipart_body("audio", "voice.wav", "audio/wav", b"x"));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "field required: file");
}

// ── Model-backed ────────────────────────────────────────────────────────────

#[tokio::test]
async fn transcribes_decoded_audio() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .withf(|audio: &AudioBuffer| audio.samples.len() == 16_000 && audio.source_rate == 16_000)
        .times(1)
        .returning(|audio| {
            Ok(Transcript {
                text: "안녕하세요 반갑습니다".into(),
                duration_seconds: audio.duration_seconds(),
                chunks: 1,
            })
        });

    let (status, body) = send(model_router(recognizer), wav_upload(&wav(16_000, 1, 16_000))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "text": "안녕하세요 반갑습니다" }));
}

#[tokio::test]
async fn stereo_44k_is_mixed_and_resampled_before_inference() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .withf(|audio: &AudioBuffer| audio.samples.len() == 8_000 && audio.source_rate == 44_100)
        .times(1)
        .returning(|_| {
            Ok(Transcript {
                text: String::new(),
                duration_seconds: 0.5,
                chunks: 1,
            })
        });

    let (status, body) = send(model_router(recognizer), wav_upload(&wav(44_100, 2, 22_050))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "");
}

#[tokio::test]
async fn undecodable_upload_is_400_without_inference() {
    let mut recognizer = MockRecognizer::new();
    recognizer.expect_recognize().times(0);

    let (status, body) = send(model_router(recognizer), wav_upload(b"RIFF garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("audio decode error:"), "{detail}");
}

#[tokio::test]
async fn empty_upload_is_400() {
    let mut recognizer = MockRecognizer::new();
    recognizer.expect_recognize().times(0);

    let (status, _) = send(model_router(recognizer), wav_upload(b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn inference_failure_is_500_with_message() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .times(1)
        .returning(|_| Err(TranscriptionError::Inference("decoder run: shape mismatch".into())));

    let (status, body) = send(model_router(recognizer), wav_upload(&wav(16_000, 1, 1600))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("model inference error:"), "{detail}");
    assert!(detail.contains("shape mismatch"));
}

#[tokio::test]
async fn unbound_provider_is_500_not_loaded() {
    let service = ModelTranscriptionService::new(ProviderSlot::unavailable("load failed"));
    let app = router_for(Arc::new(service), 1 << 20);
    let (status, body) = send(app, wav_upload(&wav(16_000, 1, 1600))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "transcription model is not loaded");
}

#[tokio::test]
async fn unbound_and_inference_errors_are_distinguishable() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .returning(|_| Err(TranscriptionError::Inference("boom".into())));
    let (_, failed) = send(model_router(recognizer), wav_upload(&wav(16_000, 1, 160))).await;

    let unbound = router_for(
        Arc::new(ModelTranscriptionService::new(ProviderSlot::unavailable("x"))),
        1 << 20,
    );
    let (_, missing) = send(unbound, wav_upload(&wav(16_000, 1, 160))).await;

    assert_ne!(failed["detail"], missing["detail"]);
}

// ── Request validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn non_multipart_body_is_422() {
    let mut recognizer = MockRecognizer::new();
    recognizer.expect_recognize().times(0);

    let req = Request::builder()
        .method("POST")
        .uri("/asr/transcribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(model_router(recognizer), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let app = router_for(Arc::new(DummyTranscriptionService), 4096);
    let (status, body) = send(app, wav_upload(&vec![0u8; 64 * 1024])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn get_is_method_not_allowed() {
    let app = router_for(Arc::new(DummyTranscriptionService), 1 << 20);
    let req = Request::builder()
        .uri("/asr/transcribe")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
