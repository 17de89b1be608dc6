//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SilvertoneSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `SILVERTONE_*` environment overrides (highest priority)
//! 4. Validate ranges that serde cannot express
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use silvertone_logging::{LogFormat, LogLevel};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::SilvertoneSettings;

/// Longest segment the Whisper encoder accepts.
const MAX_CHUNK_LENGTH_SECS: u32 = 30;
/// Whisper decoder context length.
const MAX_NEW_TOKENS: usize = 448;

/// Resolve the path to the settings file (`~/.silvertone/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".silvertone").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SilvertoneSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a path the operator named explicitly.
///
/// Unlike [`load_settings_from_path`], a missing file is an error.
pub fn load_required_settings(path: &Path) -> Result<SilvertoneSettings> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.display().to_string()));
    }
    load_settings_from_path(path)
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or out-of-range values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<SilvertoneSettings> {
    let defaults = serde_json::to_value(SilvertoneSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: SilvertoneSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// - Integers must be valid and within the specified range
/// - Invalid values are ignored with a warning (fall back to file/default)
pub fn apply_env_overrides(settings: &mut SilvertoneSettings) {
    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("SILVERTONE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("SILVERTONE_ASR_PORT", 1, 65535) {
        settings.server.asr_port = v;
    }
    if let Some(v) = read_env_u16("SILVERTONE_EMOTION_PORT", 1, 65535) {
        settings.server.emotion_port = v;
    }
    if let Some(v) = read_env_usize("SILVERTONE_MAX_UPLOAD_BYTES", 1024, 1_073_741_824) {
        settings.server.max_upload_bytes = v;
    }

    // ── ASR ─────────────────────────────────────────────────────────
    if let Some(v) = read_env_string("SILVERTONE_ASR_MODEL_DIR") {
        settings.asr.model_dir = v;
    }
    if let Some(v) = read_env_string("SILVERTONE_ASR_TOKENIZER") {
        settings.asr.tokenizer = v;
    }
    if let Some(v) = read_env_string("SILVERTONE_ASR_LANGUAGE") {
        settings.asr.language = v;
    }

    // ── Emotion ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("SILVERTONE_EMOTION_MODEL_DIR") {
        settings.emotion.model_dir = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("SILVERTONE_LOG_LEVEL") {
        settings.logging.level = LogLevel::from_str_lossy(&v);
    }
    if let Some(v) = read_env_string("SILVERTONE_LOG_FORMAT") {
        settings.logging.format = LogFormat::from_str_lossy(&v);
    }
}

/// Reject values that deserialize fine but cannot be served.
pub fn validate(settings: &SilvertoneSettings) -> Result<()> {
    let asr = &settings.asr;
    if asr.chunk_length_secs == 0 || asr.chunk_length_secs > MAX_CHUNK_LENGTH_SECS {
        return Err(SettingsError::InvalidValue(format!(
            "asr.chunkLengthSecs must be within 1..={MAX_CHUNK_LENGTH_SECS}, got {}",
            asr.chunk_length_secs
        )));
    }
    if asr.max_new_tokens == 0 || asr.max_new_tokens > MAX_NEW_TOKENS {
        return Err(SettingsError::InvalidValue(format!(
            "asr.maxNewTokens must be within 1..={MAX_NEW_TOKENS}, got {}",
            asr.max_new_tokens
        )));
    }
    if settings.emotion.max_length == 0 {
        return Err(SettingsError::InvalidValue(
            "emotion.maxLength must be positive".into(),
        ));
    }
    if settings.emotion.neutral_label.is_empty() {
        return Err(SettingsError::InvalidValue(
            "emotion.neutralLabel must not be empty".into(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
