//! Integration tests for reference persistence across storage backends

use droidbatt_refdata::{
    CacheDocument, ReferenceEntry, ReferenceStorage, ReferenceTable, SettingsStore,
};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn table_with(model: &str, brand: &str, name: &str) -> ReferenceTable {
    let mut entries = HashMap::new();
    entries.insert(
        model.to_string(),
        ReferenceEntry {
            brand: brand.to_string(),
            name: name.to_string(),
            device: "dev".to_string(),
        },
    );
    ReferenceTable {
        hash: format!("{brand}=="),
        timestamp: 1700000000,
        entries,
    }
}

#[test]
fn test_cache_and_settings_agree_after_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("devices.json");
    let db_path = dir.path().join("settings.db");
    let table = table_with("Pixel 7", "Google", "Pixel 7");

    CacheDocument::from_table(&table).save(&cache_path).unwrap();
    SettingsStore::open(&db_path)
        .unwrap()
        .save_table(&table)
        .unwrap();

    let from_cache = CacheDocument::load(&cache_path).unwrap().into_table();
    let from_store = SettingsStore::open(&db_path).unwrap().load_table().unwrap();

    assert_eq!(from_cache.hash, from_store.hash);
    assert_eq!(from_cache.entries, from_store.entries);
    assert_eq!(from_cache.entries, table.entries);
}

#[test]
fn test_bootstrap_prefers_settings_store_over_cache() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("devices.json");
    let db_path = dir.path().join("settings.db");

    CacheDocument::from_table(&table_with("M1", "CacheBrand", "From Cache"))
        .save(&cache_path)
        .unwrap();
    SettingsStore::open(&db_path)
        .unwrap()
        .save_table(&table_with("M1", "SettingsBrand", "From Settings"))
        .unwrap();

    let storage = ReferenceStorage::new(
        "http://localhost/unused.csv".to_string(),
        Duration::from_secs(5),
        cache_path,
        &db_path,
    )
    .unwrap();
    storage.bootstrap();

    assert_eq!(storage.describe("M1"), "SettingsBrand From Settings");
}

#[test]
fn test_bootstrap_falls_back_to_cache() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("devices.json");
    let db_path = dir.path().join("settings.db");

    CacheDocument::from_table(&table_with("M1", "CacheBrand", "From Cache"))
        .save(&cache_path)
        .unwrap();

    let storage = ReferenceStorage::new(
        "http://localhost/unused.csv".to_string(),
        Duration::from_secs(5),
        cache_path,
        &db_path,
    )
    .unwrap();
    storage.bootstrap();

    assert_eq!(storage.describe("M1"), "CacheBrand From Cache");
}
