//! Source member id -> destination user id translation.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{MigrationError, Result};

/// Read-only identity map, built once before any card is processed.
///
/// The on-disk form is a flat JSON object:
/// `{"<source member id>": "<destination user id>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMap {
    entries: HashMap<String, String>,
}

impl UserMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, rejecting empty ids on either side.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = HashMap::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            if k.trim().is_empty() {
                return Err(MigrationError::InvalidUserMap(
                    "source member id must not be empty".to_string(),
                ));
            }
            if v.trim().is_empty() {
                return Err(MigrationError::InvalidUserMap(format!(
                    "destination id for '{k}' must not be empty"
                )));
            }
            entries.insert(k, v);
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| MigrationError::InvalidUserMap(e.to_string()))?;
        Self::from_pairs(raw)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Destination id for a source member, if mapped.
    pub fn resolve(&self, source_id: &str) -> Option<&str> {
        self.entries.get(source_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
