//! Server configuration.

use serde::{Deserialize, Serialize};
use silvertone_settings::ServerSettings;

/// Listener configuration for one service process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Build from settings with the port of the service being started.
    pub fn from_settings(settings: &ServerSettings, port: u16) -> Self {
        Self {
            host: settings.host.clone(),
            port,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings = ServerSettings::default();
        Self::from_settings(&settings, settings.asr_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn from_settings_uses_given_port() {
        let settings = ServerSettings {
            host: "127.0.0.1".into(),
            ..ServerSettings::default()
        };
        let cfg = ServerConfig::from_settings(&settings, settings.emotion_port);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8001");
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_upload_bytes, cfg.max_upload_bytes);
    }
}
