//! JSON cache file for the reference table

use crate::{RefdataError, ReferenceEntry, ReferenceTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Current cache file schema version
pub const CACHE_SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    CACHE_SCHEMA_VERSION
}

/// On-disk layout of the cache file: one nested map keyed by model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub hash: String,
    pub timestamp: u64,
    pub items: HashMap<String, ReferenceEntry>,
}

impl CacheDocument {
    /// Snapshot a table for writing
    pub fn from_table(table: &ReferenceTable) -> Self {
        Self {
            version: CACHE_SCHEMA_VERSION,
            hash: table.hash.clone(),
            timestamp: table.timestamp,
            items: table.entries.clone(),
        }
    }

    /// Turn a loaded document back into a table
    pub fn into_table(self) -> ReferenceTable {
        ReferenceTable {
            hash: self.hash,
            timestamp: self.timestamp,
            entries: self.items,
        }
    }

    /// Load and validate a cache file
    pub fn load(path: &Path) -> Result<Self, RefdataError> {
        let contents = std::fs::read_to_string(path)?;
        let document: Self = serde_json::from_str(&contents)?;
        if document.version != CACHE_SCHEMA_VERSION {
            return Err(RefdataError::Parse(format!(
                "unsupported cache schema version {}",
                document.version
            )));
        }
        Ok(document)
    }

    /// Write the cache file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), RefdataError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        tracing::debug!("Reference cache written to {}", path.display());
        Ok(())
    }
}
