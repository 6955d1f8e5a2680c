//! Device reference data for droidbatt
//!
//! Maintains the model -> brand/name lookup table sourced from the Google
//! Play supported-devices CSV feed and keeps it fresh without redundant
//! downloads. The remote feed publishes a base64 MD5 content hash in its
//! response headers; a refresh only downloads the payload when that hash
//! differs from the one stored locally.
//!
//! # Features
//!
//! - HEAD probe with content-hash comparison before any download
//! - CSV projection into a model-keyed reference table
//! - Redundant persistence: JSON cache file plus a SQLite settings store
//! - Busy-guarded refresh state machine that always returns to idle

mod cache;
mod feed;
mod parse;
mod storage;
mod store;
mod sync;
mod table;

use thiserror::Error;

pub use cache::{CACHE_SCHEMA_VERSION, CacheDocument};
pub use feed::{DEFAULT_FEED_URL, FeedPayload, HttpFeed, ProbeInfo};
pub use parse::parse_reference_csv;
pub use storage::ReferenceStorage;
pub use store::SettingsStore;
pub use sync::{SyncEffect, SyncEvent, SyncOutcome, SyncState, transition};
pub use table::{ReferenceEntry, ReferenceTable};

#[derive(Debug, Error)]
pub enum RefdataError {
    #[error("reference update already running")]
    Busy,

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("persist failed: {0}")]
    Persist(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings store error: {0}")]
    Store(#[from] rusqlite::Error),
}
