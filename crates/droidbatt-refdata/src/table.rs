//! In-memory reference table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display data for one known device model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Retail branding, e.g. "Google"
    pub brand: String,
    /// Marketing name, e.g. "Pixel 7"
    pub name: String,
    /// Device code, e.g. "panther"
    pub device: String,
}

/// Model -> display-name lookup table.
///
/// `hash` is the base64 MD5 content hash of the last successfully ingested
/// feed payload; an empty hash means no data has been loaded yet, which is
/// the predicate callers use to decide whether bootstrapping is needed.
/// The hash and the entries are only ever replaced together, so
/// `hash == ""` holds exactly when `entries` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    pub hash: String,
    pub timestamp: u64,
    pub entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    /// True while no feed payload has ever been ingested
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Drop all data, returning to the never-loaded state
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the whole table contents in one step.
    ///
    /// An empty entry map drops the hash as well, keeping the emptiness
    /// predicate truthful.
    pub fn replace(&mut self, hash: String, timestamp: u64, entries: HashMap<String, ReferenceEntry>) {
        self.hash = if entries.is_empty() { String::new() } else { hash };
        self.timestamp = timestamp;
        self.entries = entries;
    }

    /// Human-readable description for a raw model string.
    ///
    /// Known models map to "{brand} {name}" with empty segments omitted;
    /// unknown models (or entries with neither brand nor name) fall back
    /// to the raw model string itself.
    pub fn describe(&self, model: &str) -> String {
        let Some(entry) = self.entries.get(model) else {
            return model.to_string();
        };
        let parts: Vec<&str> = [entry.brand.as_str(), entry.name.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            model.to_string()
        } else {
            parts.join(" ")
        }
    }
}
