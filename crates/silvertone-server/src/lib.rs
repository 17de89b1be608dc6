//! # silvertone-server
//!
//! Axum HTTP server for the inference services.
//!
//! - `POST /asr/transcribe`: multipart audio upload to text
//! - `POST /emotion/analyze`: JSON text to one emotion label
//! - Model-backed and stand-in variants behind the same router
//! - `/health`, optional Prometheus `/metrics`
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod asr;
pub mod bootstrap;
pub mod config;
pub mod emotion;
pub mod error;
pub mod health;
pub mod metrics;
pub mod provider;
pub mod server;
pub mod shutdown;

pub use asr::{DummyTranscriptionService, ModelTranscriptionService, TranscriptionService};
pub use bootstrap::{BootstrapError, load_emotion_service, load_transcription_service};
pub use config::ServerConfig;
pub use emotion::{DummyEmotionService, EmotionService, ModelEmotionService};
pub use error::{ApiError, ErrorResponse};
pub use provider::ProviderSlot;
pub use server::{Endpoint, InferenceServer, Variant};
pub use shutdown::ShutdownCoordinator;
