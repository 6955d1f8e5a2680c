//! Durable settings store backed by SQLite

use crate::{RefdataError, ReferenceEntry, ReferenceTable};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;

/// Namespace prefix for every key this application owns
const SETTINGS_PREFIX: &str = "droidbatt.reference.";

const FIELDS: [&str; 3] = ["brand", "name", "device"];

/// Key-value settings store.
///
/// The reference table is stored as five namespaced keys: `hash`,
/// `timestamp`, and one JSON string-keyed map per field (`brand`, `name`,
/// `device`), mirroring the redundant cache file.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Open or create a settings database
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RefdataError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, RefdataError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), RefdataError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, RefdataError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![format!("{SETTINGS_PREFIX}{key}")],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RefdataError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![format!("{SETTINGS_PREFIX}{key}"), value],
        )?;
        Ok(())
    }

    fn get_map(&self, key: &str) -> Result<Option<HashMap<String, String>>, RefdataError> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                tracing::warn!("Settings key \"{key}\" holds malformed JSON: {e}");
                Ok(None)
            }
        }
    }

    /// Load the reference table from the store.
    ///
    /// Any missing or corrupt key yields an empty (cleared) table rather
    /// than a partial one; so does a hash that disagrees with the entries.
    pub fn load_table(&self) -> Result<ReferenceTable, RefdataError> {
        let (Some(hash), Some(timestamp)) = (self.get("hash")?, self.get("timestamp")?) else {
            return Ok(ReferenceTable::default());
        };
        let Ok(timestamp) = timestamp.parse::<u64>() else {
            tracing::warn!("Settings timestamp is not a number, clearing table");
            return Ok(ReferenceTable::default());
        };

        let mut entries: HashMap<String, ReferenceEntry> = HashMap::new();
        for field in FIELDS {
            let Some(map) = self.get_map(field)? else {
                return Ok(ReferenceTable::default());
            };
            for (model, value) in map {
                let entry = entries.entry(model).or_default();
                match field {
                    "brand" => entry.brand = value,
                    "name" => entry.name = value,
                    _ => entry.device = value,
                }
            }
        }

        // hash and entries must agree on emptiness
        if hash.is_empty() != entries.is_empty() {
            return Ok(ReferenceTable::default());
        }
        Ok(ReferenceTable {
            hash,
            timestamp,
            entries,
        })
    }

    /// Persist the reference table to the store in one transaction
    pub fn save_table(&self, table: &ReferenceTable) -> Result<(), RefdataError> {
        let tx = self.conn.unchecked_transaction()?;
        self.set("hash", &table.hash)?;
        self.set("timestamp", &table.timestamp.to_string())?;
        for field in FIELDS {
            let map: HashMap<&str, &str> = table
                .entries
                .iter()
                .map(|(model, entry)| {
                    let value = match field {
                        "brand" => entry.brand.as_str(),
                        "name" => entry.name.as_str(),
                        _ => entry.device.as_str(),
                    };
                    (model.as_str(), value)
                })
                .collect();
            self.set(field, &serde_json::to_string(&map)?)?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ReferenceTable {
        let mut entries = HashMap::new();
        entries.insert(
            "Pixel 7".to_string(),
            ReferenceEntry {
                brand: "Google".to_string(),
                name: "Pixel 7".to_string(),
                device: "panther".to_string(),
            },
        );
        entries.insert(
            "AX-1".to_string(),
            ReferenceEntry {
                brand: "Acme".to_string(),
                name: String::new(),
                device: "ax1".to_string(),
            },
        );
        ReferenceTable {
            hash: "abc==".to_string(),
            timestamp: 1700000000,
            entries,
        }
    }

    #[test]
    fn test_store_round_trip() {
        let store = SettingsStore::in_memory().unwrap();
        let table = sample_table();

        store.save_table(&table).unwrap();
        let loaded = store.load_table().unwrap();

        assert_eq!(loaded.hash, table.hash);
        assert_eq!(loaded.timestamp, table.timestamp);
        assert_eq!(loaded.entries, table.entries);
    }

    #[test]
    fn test_store_empty_yields_cleared_table() {
        let store = SettingsStore::in_memory().unwrap();
        let loaded = store.load_table().unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.entries.is_empty());
    }

    #[test]
    fn test_store_corrupt_map_clears_table() {
        let store = SettingsStore::in_memory().unwrap();
        store.save_table(&sample_table()).unwrap();
        store.set("brand", "{broken").unwrap();

        let loaded = store.load_table().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_store_inconsistent_hash_clears_table() {
        let store = SettingsStore::in_memory().unwrap();
        let mut table = sample_table();
        table.entries.clear();
        // non-empty hash with no entries violates the table invariant
        store.save_table(&table).unwrap();

        let loaded = store.load_table().unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.hash.is_empty());
    }

    #[test]
    fn test_store_overwrite() {
        let store = SettingsStore::in_memory().unwrap();
        store.save_table(&sample_table()).unwrap();

        let mut next = sample_table();
        next.hash = "def==".to_string();
        next.entries.remove("AX-1");
        store.save_table(&next).unwrap();

        let loaded = store.load_table().unwrap();
        assert_eq!(loaded.hash, "def==");
        assert_eq!(loaded.entries.len(), 1);
    }
}
