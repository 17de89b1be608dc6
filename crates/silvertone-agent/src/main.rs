//! # silvertone
//!
//! Service binary. Loads settings, installs logging and metrics, builds one
//! inference endpoint (speech-to-text or emotion), and serves it until
//! SIGINT/SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use silvertone_server::{
    DummyEmotionService, DummyTranscriptionService, Endpoint, InferenceServer, ServerConfig,
};
use silvertone_settings::SilvertoneSettings;
use tokio::net::TcpListener;

/// Korean speech-to-text and emotion inference server.
#[derive(Parser, Debug)]
#[command(name = "silvertone", about = "Speech-to-text and emotion inference server")]
struct Cli {
    /// Settings file (defaults to `~/.silvertone/settings.json` when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /asr/transcribe`.
    Asr {
        #[command(flatten)]
        common: ServeArgs,

        /// Tokenizer hub repo or local `tokenizer.json` path.
        #[arg(long)]
        tokenizer: Option<String>,

        /// Transcription language code.
        #[arg(long)]
        language: Option<String>,
    },
    /// Serve `POST /emotion/analyze`.
    Emotion {
        #[command(flatten)]
        common: ServeArgs,
    },
}

/// Flags shared by both services.
#[derive(Args, Debug)]
struct ServeArgs {
    /// Return fixed responses without loading a model.
    #[arg(long)]
    dummy: bool,

    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Model artifact directory.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

impl Command {
    fn common(&self) -> &ServeArgs {
        match self {
            Self::Asr { common, .. } | Self::Emotion { common } => common,
        }
    }
}

/// Settings file named on the command line must exist; the default one may not.
fn load_settings(cli: &Cli) -> Result<SilvertoneSettings> {
    match &cli.config {
        Some(path) => silvertone_settings::load_required_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => silvertone_settings::load_settings().context("Failed to load settings"),
    }
}

/// Fold command-line flags into the loaded settings.
fn apply_cli(settings: &mut SilvertoneSettings, command: &Command) {
    let common = command.common();
    if let Some(ref host) = common.host {
        settings.server.host.clone_from(host);
    }

    match command {
        Command::Asr {
            tokenizer,
            language,
            ..
        } => {
            if let Some(port) = common.port {
                settings.server.asr_port = port;
            }
            if let Some(ref dir) = common.model_dir {
                settings.asr.model_dir = dir.display().to_string();
            }
            if let Some(tokenizer) = tokenizer {
                settings.asr.tokenizer.clone_from(tokenizer);
            }
            if let Some(language) = language {
                settings.asr.language.clone_from(language);
            }
        }
        Command::Emotion { .. } => {
            if let Some(port) = common.port {
                settings.server.emotion_port = port;
            }
            if let Some(ref dir) = common.model_dir {
                settings.emotion.model_dir = dir.display().to_string();
            }
        }
    }
}

/// Server configuration for the selected service.
fn server_config(settings: &SilvertoneSettings, command: &Command) -> ServerConfig {
    let port = match command {
        Command::Asr { .. } => settings.server.asr_port,
        Command::Emotion { .. } => settings.server.emotion_port,
    };
    ServerConfig::from_settings(&settings.server, port)
}

/// Build the endpoint, loading the model unless `--dummy` was given.
async fn build_endpoint(settings: &SilvertoneSettings, command: &Command) -> Result<Endpoint> {
    let dummy = command.common().dummy;
    let endpoint = match command {
        Command::Asr { .. } if dummy => Endpoint::Asr(Arc::new(DummyTranscriptionService)),
        Command::Emotion { .. } if dummy => Endpoint::Emotion(Arc::new(DummyEmotionService)),
        Command::Asr { .. } => Endpoint::Asr(Arc::new(
            silvertone_server::load_transcription_service(&settings.asr).await?,
        )),
        Command::Emotion { .. } => Endpoint::Emotion(Arc::new(
            silvertone_server::load_emotion_service(&settings.emotion).await?,
        )),
    };
    Ok(endpoint)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli)?;
    apply_cli(&mut settings, &cli.command);
    silvertone_settings::validate(&settings).context("Invalid settings")?;

    silvertone_logging::init_subscriber(settings.logging.level, settings.logging.format)
        .context("Failed to initialize logging")?;

    let metrics = silvertone_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let config = server_config(&settings, &cli.command);
    let endpoint = build_endpoint(&settings, &cli.command).await?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let server = InferenceServer::new(config, endpoint).with_metrics(metrics);
    let shutdown = Arc::clone(server.shutdown());
    let signal_task = silvertone_server::shutdown::spawn_signal_listener(Arc::clone(&shutdown));

    server.serve(listener).await.context("Server error")?;

    tracing::info!("Shutting down...");
    shutdown.drain(vec![signal_task], None).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
