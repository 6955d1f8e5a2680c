//! Refresh state machine
//!
//! The multi-step refresh workflow (probe, fetch, parse, persist) is
//! modelled as an explicit state enum plus a pure transition function so
//! every transition can be tested on its own. The async driver lives in
//! [`crate::ReferenceStorage`]; whatever happens there, the machine is put
//! back to [`SyncState::Idle`] before the driver returns.

/// State of the refresh workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    /// No refresh running; the only state a run may end in
    Idle = 0,
    /// HEAD probe in flight, comparing content hashes
    CheckingHash = 1,
    /// Full download and parse in flight
    LoadingFile = 2,
    /// Writing the new table to the cache file and settings store
    SavingFile = 3,
}

impl SyncState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SyncState::CheckingHash,
            2 => SyncState::LoadingFile,
            3 => SyncState::SavingFile,
            _ => SyncState::Idle,
        }
    }
}

/// Inputs driving the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A refresh was requested
    Trigger,
    /// Probe finished; `changed` compares remote and stored hashes
    ProbeOk { changed: bool },
    /// Probe failed or returned a non-success status
    ProbeFailed,
    /// Download succeeded and the payload parsed
    FetchOk,
    /// Download failed or returned a non-success status
    FetchFailed,
    /// Download succeeded but the payload did not parse
    ParseFailed,
    /// Persistence finished (possibly best-effort)
    Persisted,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEffect {
    /// Issue the HEAD probe
    Probe,
    /// Issue the full GET and parse the payload
    Fetch,
    /// Replace the table and write both stores
    Persist,
}

/// Outcome of a completed refresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote hash matched the stored one, nothing was touched
    Unchanged,
    /// The table was replaced with this many models
    Updated { models: usize },
}

/// Pure transition function: `(state, event) -> (state, effect)`.
///
/// Unknown combinations leave the state unchanged with no effect, which
/// in particular rejects a `Trigger` while a run is already in flight.
pub fn transition(state: SyncState, event: SyncEvent) -> (SyncState, Option<SyncEffect>) {
    match (state, event) {
        (SyncState::Idle, SyncEvent::Trigger) => (SyncState::CheckingHash, Some(SyncEffect::Probe)),
        (SyncState::CheckingHash, SyncEvent::ProbeOk { changed: true }) => {
            (SyncState::LoadingFile, Some(SyncEffect::Fetch))
        }
        (SyncState::CheckingHash, SyncEvent::ProbeOk { changed: false })
        | (SyncState::CheckingHash, SyncEvent::ProbeFailed) => (SyncState::Idle, None),
        (SyncState::LoadingFile, SyncEvent::FetchOk) => {
            (SyncState::SavingFile, Some(SyncEffect::Persist))
        }
        (SyncState::LoadingFile, SyncEvent::FetchFailed | SyncEvent::ParseFailed) => {
            (SyncState::Idle, None)
        }
        (SyncState::SavingFile, SyncEvent::Persisted) => (SyncState::Idle, None),
        (state, _) => (state, None),
    }
}
