//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production default values.
//! Types marked with `#[serde(default)]` allow partial JSON; missing fields
//! get their default value during deserialization.

mod inference;
mod server;

pub use inference::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use silvertone_logging::{LogFormat, LogLevel};

/// Root settings type for both services.
///
/// Loaded from `~/.silvertone/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "asrPort": 9002 },
///   "asr": { "modelDir": "models/stt_gs" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SilvertoneSettings {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Speech-to-text model settings.
    pub asr: AsrSettings,
    /// Emotion classification model settings.
    pub emotion: EmotionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Logging configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Base level when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Stdout format.
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SilvertoneSettings::default()).unwrap();
        assert!(json["server"].get("asrPort").is_some());
        assert!(json["asr"].get("chunkLengthSecs").is_some());
        assert!(json["emotion"].get("neutralLabel").is_some());
        assert_eq!(json["logging"]["level"], "info");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: SilvertoneSettings =
            serde_json::from_str(r#"{"logging": {"format": "json"}}"#).unwrap();
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert_eq!(settings.server.asr_port, 9001);
    }
}
