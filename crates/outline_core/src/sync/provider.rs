//! Remote-sync collaborator seam.
//!
//! # Responsibility
//! - Define the pull/push contract the outline store uses to load and
//!   persist snapshots.
//! - Provide an in-process provider for tests, CLI and FFI sessions.
//!
//! # Invariants
//! - Providers exchange whole snapshots; they never receive partial edits.
//! - Transport, auth and conflict policy stay behind this trait.

use crate::model::node::Outline;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Errors reported by a sync provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Remote could not be reached.
    Unavailable(String),
    /// Remote refused the request (auth, validation, quota).
    Rejected(String),
    /// Remote returned data that is not an outline snapshot.
    InvalidPayload(String),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "sync provider unavailable: {message}"),
            Self::Rejected(message) => write!(f, "sync provider rejected request: {message}"),
            Self::InvalidPayload(message) => write!(f, "invalid sync payload: {message}"),
        }
    }
}

impl Error for SyncError {}

/// Snapshot transport used by [`crate::OutlineStore::reload`] and
/// [`crate::OutlineStore::commit`].
pub trait SyncProvider {
    /// Stable provider identifier for diagnostics.
    fn provider_id(&self) -> &str;
    /// Fetches the latest remote snapshot.
    fn pull(&self) -> Result<Outline, SyncError>;
    /// Persists `outline` as the new remote snapshot.
    fn push(&self, outline: &Outline) -> Result<(), SyncError>;
}

/// In-memory provider holding one remote snapshot.
#[derive(Debug, Default)]
pub struct MemorySyncProvider {
    provider_id: String,
    state: Mutex<MemoryRemote>,
}

#[derive(Debug, Default)]
struct MemoryRemote {
    snapshot: Outline,
    push_count: usize,
    fail_next: Option<SyncError>,
}

impl MemorySyncProvider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self::with_snapshot(provider_id, Outline::default())
    }

    /// Creates a provider whose remote already holds `snapshot`.
    pub fn with_snapshot(provider_id: impl Into<String>, snapshot: Outline) -> Self {
        Self {
            provider_id: provider_id.into(),
            state: Mutex::new(MemoryRemote {
                snapshot,
                ..MemoryRemote::default()
            }),
        }
    }

    /// Returns the snapshot currently held remotely.
    pub fn remote_snapshot(&self) -> Outline {
        self.lock().snapshot.clone()
    }

    /// Replaces the remote snapshot, as another editor's save would.
    pub fn set_remote_snapshot(&self, snapshot: Outline) {
        self.lock().snapshot = snapshot;
    }

    /// Number of successful pushes.
    pub fn push_count(&self) -> usize {
        self.lock().push_count
    }

    /// Makes the next pull or push fail with `error`.
    pub fn fail_next(&self, error: SyncError) {
        self.lock().fail_next = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemote> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncProvider for MemorySyncProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn pull(&self) -> Result<Outline, SyncError> {
        let mut remote = self.lock();
        if let Some(error) = remote.fail_next.take() {
            return Err(error);
        }
        Ok(remote.snapshot.clone())
    }

    fn push(&self, outline: &Outline) -> Result<(), SyncError> {
        let mut remote = self.lock();
        if let Some(error) = remote.fail_next.take() {
            return Err(error);
        }
        remote.snapshot = outline.clone();
        remote.push_count += 1;
        Ok(())
    }
}
