//! `id2label` mapping from the checkpoint's `config.json`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{EmotionError, Result};

#[derive(Deserialize)]
struct CheckpointConfig {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// Class index to label name, dense from zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Read `config.json` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse the `id2label` table. Keys must cover `0..n` without gaps.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: CheckpointConfig = serde_json::from_str(content)?;
        if config.id2label.is_empty() {
            return Err(EmotionError::Config("id2label is missing or empty".into()));
        }

        let mut indexed = Vec::with_capacity(config.id2label.len());
        for (key, label) in config.id2label {
            let idx: usize = key
                .parse()
                .map_err(|_| EmotionError::Config(format!("non-numeric label id {key:?}")))?;
            indexed.push((idx, label));
        }
        indexed.sort_by_key(|(idx, _)| *idx);

        for (expected, (idx, _)) in indexed.iter().enumerate() {
            if *idx != expected {
                return Err(EmotionError::Config(format!(
                    "label ids are not contiguous: expected {expected}, found {idx}"
                )));
            }
        }

        Ok(Self {
            labels: indexed.into_iter().map(|(_, label)| label).collect(),
        })
    }

    /// Label for class `idx`.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a successfully parsed map.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class order.
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
