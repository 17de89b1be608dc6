//! HTTP listener settings.

use serde::{Deserialize, Serialize};

/// Server network settings shared by both services.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Port of the speech-to-text service.
    pub asr_port: u16,
    /// Port of the emotion classification service.
    pub emotion_port: u16,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            asr_port: 9001,
            emotion_port: 8001,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}
