//! Shared reference storage and the refresh driver

use crate::cache::CacheDocument;
use crate::feed::HttpFeed;
use crate::parse::parse_reference_csv;
use crate::store::SettingsStore;
use crate::sync::{SyncEffect, SyncEvent, SyncOutcome, SyncState, transition};
use crate::{RefdataError, ReferenceTable};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Process-wide reference storage.
///
/// Holds the in-memory table behind a read lock for the poll loop's
/// lookups, plus both persistence backends. At most one refresh runs at a
/// time; the state word doubles as the non-blocking busy guard. The write
/// lock is only taken for the in-memory replacement, never across an
/// await point, so lookups are never blocked by network I/O.
pub struct ReferenceStorage {
    table: RwLock<ReferenceTable>,
    state: AtomicU8,
    feed: HttpFeed,
    cache_path: PathBuf,
    settings: Mutex<SettingsStore>,
}

impl ReferenceStorage {
    /// Create a storage backed by the given feed and persistence paths
    pub fn new(
        feed_url: String,
        timeout: Duration,
        cache_path: PathBuf,
        settings_db: &Path,
    ) -> Result<Self, RefdataError> {
        Ok(Self {
            table: RwLock::new(ReferenceTable::default()),
            state: AtomicU8::new(SyncState::Idle as u8),
            feed: HttpFeed::new(feed_url, timeout),
            cache_path,
            settings: Mutex::new(SettingsStore::open(settings_db)?),
        })
    }

    /// Current state of the refresh workflow
    pub fn sync_state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SyncState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Atomically claim the idle -> checking transition.
    ///
    /// This is the busy guard: a second caller loses the exchange and is
    /// rejected without touching the in-flight run.
    fn begin_refresh(&self) -> bool {
        self.state
            .compare_exchange(
                SyncState::Idle as u8,
                SyncState::CheckingHash as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// True while no reference data has been loaded from any source
    pub fn is_empty(&self) -> bool {
        self.table.read().unwrap().is_empty()
    }

    /// Unix seconds of the last successful update
    pub fn last_updated(&self) -> u64 {
        self.table.read().unwrap().timestamp
    }

    /// Display name for a raw model string
    pub fn describe(&self, model: &str) -> String {
        self.table.read().unwrap().describe(model)
    }

    /// Load the table from local sources, in priority order.
    ///
    /// Settings store first, then the cache file (mirrored back into the
    /// settings store on success). All failures are tolerated: whichever
    /// source loads wins, and an empty table just means a remote refresh
    /// is needed. Finally the cache file is created if it does not exist
    /// yet, so later startups skip the existence checks.
    pub fn bootstrap(&self) {
        if self.is_empty() {
            match self.settings.lock().unwrap().load_table() {
                Ok(table) if !table.is_empty() => {
                    tracing::info!(
                        "Devices reference loaded from settings store ({} models)",
                        table.entries.len()
                    );
                    *self.table.write().unwrap() = table;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Settings store load failed: {e}"),
            }
        }

        if self.is_empty() {
            match CacheDocument::load(&self.cache_path) {
                Ok(document) => {
                    let table = document.into_table();
                    if !table.is_empty() {
                        tracing::info!(
                            "Stored devices reference loaded from \"{}\"",
                            self.cache_path.display()
                        );
                        *self.table.write().unwrap() = table;
                        if let Err(e) = self.save_settings() {
                            tracing::warn!("Can't mirror devices reference to settings: {e}");
                        }
                    }
                }
                Err(RefdataError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!(
                        "Devices reference cache \"{}\" does not exist yet",
                        self.cache_path.display()
                    );
                }
                Err(e) => tracing::warn!(
                    "Devices reference cache \"{}\" loading error: {e}",
                    self.cache_path.display()
                ),
            }
        }

        self.save_cache_if_missing();
    }

    /// Write the current (possibly empty) table to the cache file unless
    /// the file already exists or a refresh is about to replace it
    pub fn save_cache_if_missing(&self) {
        if !self.cache_path.exists() && self.sync_state() == SyncState::Idle {
            if let Err(e) = self.save_cache() {
                tracing::error!(
                    "Can't store devices reference to \"{}\": {e}",
                    self.cache_path.display()
                );
            }
        }
    }

    fn save_cache(&self) -> Result<(), RefdataError> {
        let snapshot = self.table.read().unwrap().clone();
        CacheDocument::from_table(&snapshot).save(&self.cache_path)
    }

    fn save_settings(&self) -> Result<(), RefdataError> {
        let snapshot = self.table.read().unwrap().clone();
        self.settings.lock().unwrap().save_table(&snapshot)
    }

    /// Run the remote refresh workflow once.
    ///
    /// Rejected with [`RefdataError::Busy`] while another run is in
    /// flight; there is no queueing and the in-flight run is unaffected.
    /// Whatever happens, the state machine is back at idle when this
    /// returns.
    pub async fn load_remote(&self) -> Result<SyncOutcome, RefdataError> {
        if !self.begin_refresh() {
            tracing::warn!("Devices reference update already running");
            return Err(RefdataError::Busy);
        }

        let outcome = self.run_refresh().await;
        // a run must end idle no matter which step bailed out
        self.set_state(SyncState::Idle);

        match &outcome {
            Ok(SyncOutcome::Unchanged) => {
                tracing::info!(
                    "Remote feed not changed; last updated at {}",
                    self.last_updated()
                );
            }
            Ok(SyncOutcome::Updated { models }) => {
                tracing::info!("Devices reference updated, {models} models");
            }
            Err(e) => tracing::error!("Devices reference update failed: {e}"),
        }
        outcome
    }

    async fn run_refresh(&self) -> Result<SyncOutcome, RefdataError> {
        // state is CheckingHash, claimed by begin_refresh
        let probe = self.feed.probe().await?;
        let stored_hash = self.table.read().unwrap().hash.clone();
        let changed = probe.hash != stored_hash;
        let (state, effect) = transition(SyncState::CheckingHash, SyncEvent::ProbeOk { changed });
        self.set_state(state);
        if effect != Some(SyncEffect::Fetch) {
            return Ok(SyncOutcome::Unchanged);
        }

        let payload = self.feed.fetch().await?;
        let entries = parse_reference_csv(&payload.body)?;
        let (state, _) = transition(SyncState::LoadingFile, SyncEvent::FetchOk);
        self.set_state(state);

        // a GET response without the hash header falls back to the probed hash
        let hash = if payload.hash.is_empty() {
            probe.hash
        } else {
            payload.hash
        };
        let models = entries.len();
        {
            let mut table = self.table.write().unwrap();
            table.replace(hash, unix_now(), entries);
        }

        // best-effort persistence: the in-memory update stands either way
        if let Err(e) = self.save_cache() {
            tracing::error!(
                "Can't store devices reference to \"{}\": {e}",
                self.cache_path.display()
            );
        }
        if let Err(e) = self.save_settings() {
            tracing::error!("Can't store devices reference to settings: {e}");
        }

        let (state, _) = transition(SyncState::SavingFile, SyncEvent::Persisted);
        self.set_state(state);
        Ok(SyncOutcome::Updated { models })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
