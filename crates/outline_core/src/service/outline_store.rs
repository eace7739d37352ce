//! Outline store: authoritative snapshot for one editing session.
//!
//! # Responsibility
//! - Hold the current outline and publish immutable snapshots to readers.
//! - Gate mutations through the tree mutator, singly or as atomic batches.
//! - Track the last synced snapshot and the fetch/save handshake with the
//!   remote-sync collaborator.
//!
//! # Invariants
//! - Published snapshots satisfy id uniqueness, child-kind rules and
//!   contiguous sibling order.
//! - Search never replaces the authoritative snapshot.
//! - While a fetch or save is outstanding, every mutation is rejected.
//! - A failed fetch or save keeps the last known-good snapshot.
//! - Inbound snapshots replace state wholesale; nothing is merged.

use crate::config::{LoadPolicy, StoreConfig};
use crate::error::OutlineError;
use crate::model::node::{NodeId, Outline, OutlineNode};
use crate::model::path::NodePath;
use crate::search::outline_search::{self, SearchHit};
use crate::sync::provider::{SyncError, SyncProvider};
use crate::tree::mutator::OutlineMutation;
use crate::tree::order;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Sync handshake state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A pull is outstanding; its result will replace the snapshot.
    Fetching,
    /// A push of the snapshot at `revision` is outstanding.
    Saving { revision: u64 },
}

/// Errors from outline store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Tree operation failed; surfaced unchanged.
    Outline(OutlineError),
    /// A fetch or save is outstanding.
    SyncInProgress(SyncState),
    /// `finish_*` called without a matching `begin_*`.
    NoPendingSync,
    /// Save ticket does not belong to the outstanding save.
    StaleSaveTicket { expected: u64, found: u64 },
    /// Batch exceeds `StoreConfig::max_batch_len`.
    BatchTooLarge { len: usize, max: usize },
    /// Sync provider failed; the previous snapshot is kept.
    Sync(SyncError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(err) => write!(f, "{err}"),
            Self::SyncInProgress(state) => {
                write!(f, "outline sync in progress ({state:?}); mutation rejected")
            }
            Self::NoPendingSync => write!(f, "no outline sync is pending"),
            Self::StaleSaveTicket { expected, found } => write!(
                f,
                "save ticket for revision {found} does not match pending save of revision {expected}"
            ),
            Self::BatchTooLarge { len, max } => {
                write!(f, "mutation batch of {len} exceeds limit {max}")
            }
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Outline(err) => Some(err),
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OutlineError> for StoreError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

impl From<SyncError> for StoreError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Snapshot handed to the sync collaborator by [`OutlineStore::begin_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    revision: u64,
    snapshot: Outline,
}

impl SaveTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Snapshot to persist.
    pub fn snapshot(&self) -> &Outline {
        &self.snapshot
    }
}

/// Authoritative outline holder for one editing session.
#[derive(Debug)]
pub struct OutlineStore {
    config: StoreConfig,
    current: Outline,
    committed: Outline,
    revision: u64,
    committed_revision: u64,
    sync_state: SyncState,
}

impl OutlineStore {
    /// Creates a store from an inbound snapshot.
    ///
    /// # Errors
    /// - `DuplicateId` / `InvalidChildLevel` for structurally invalid input.
    /// - `InvalidOrder` under [`LoadPolicy::Strict`] for non-contiguous orders.
    pub fn new(outline: Outline, config: StoreConfig) -> Result<Self, StoreError> {
        let prepared = prepare_snapshot(outline, config.load_policy)?;
        info!(
            "event=store_open module=store status=ok sections={} nodes={}",
            prepared.sections.len(),
            prepared.node_count()
        );
        Ok(Self {
            config,
            committed: prepared.clone(),
            current: prepared,
            revision: 0,
            committed_revision: 0,
            sync_state: SyncState::Idle,
        })
    }

    pub fn empty(config: StoreConfig) -> Self {
        Self {
            config,
            current: Outline::default(),
            committed: Outline::default(),
            revision: 0,
            committed_revision: 0,
            sync_state: SyncState::Idle,
        }
    }

    /// Returns the current snapshot. Cheap: subtrees are shared.
    pub fn snapshot(&self) -> Outline {
        self.current.clone()
    }

    pub fn current(&self) -> &Outline {
        &self.current
    }

    /// Last snapshot fetched from or saved to the sync collaborator.
    pub fn committed_snapshot(&self) -> &Outline {
        &self.committed
    }

    /// Version of the current snapshot; increases on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns whether the current snapshot differs from the committed one.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.committed_revision
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn get(&self, path: &NodePath) -> Option<&Arc<OutlineNode>> {
        self.current.get(path)
    }

    pub fn find_path(&self, id: NodeId) -> Option<NodePath> {
        self.current.find_path(id)
    }

    /// Derived, display-only filtered view of the current snapshot.
    pub fn search(&self, keyword: &str) -> Outline {
        let result = outline_search::search(&self.current, keyword);
        debug!(
            "event=outline_search module=store status=ok keyword_len={} kept_nodes={}",
            keyword.trim().chars().count(),
            result.node_count()
        );
        result
    }

    /// Name hits in the current snapshot, with paths.
    pub fn search_hits(&self, keyword: &str) -> Vec<SearchHit> {
        outline_search::search_hits(&self.current, keyword)
    }

    pub fn insert(
        &mut self,
        parent: &NodePath,
        node: OutlineNode,
        at_index: Option<usize>,
    ) -> Result<&Outline, StoreError> {
        self.apply(&OutlineMutation::Insert {
            parent: parent.clone(),
            node,
            at_index,
        })
    }

    pub fn remove(&mut self, path: &NodePath) -> Result<&Outline, StoreError> {
        self.apply(&OutlineMutation::Remove { path: path.clone() })
    }

    pub fn move_node(
        &mut self,
        from: &NodePath,
        to_parent: &NodePath,
        to_index: usize,
    ) -> Result<&Outline, StoreError> {
        self.apply(&OutlineMutation::Move {
            from: from.clone(),
            to_parent: to_parent.clone(),
            to_index,
        })
    }

    pub fn rename(&mut self, path: &NodePath, name: &str) -> Result<&Outline, StoreError> {
        self.apply(&OutlineMutation::Rename {
            path: path.clone(),
            name: name.to_string(),
        })
    }

    /// Applies one mutation and publishes the resulting snapshot.
    pub fn apply(&mut self, mutation: &OutlineMutation) -> Result<&Outline, StoreError> {
        self.ensure_idle(mutation.op_name())?;
        let next = mutation.apply(&self.current).map_err(|err| {
            warn!(
                "event=outline_mutation module=store status=error op={} error={}",
                mutation.op_name(),
                err
            );
            StoreError::Outline(err)
        })?;

        self.current = next;
        self.revision += 1;
        info!(
            "event=outline_mutation module=store status=ok op={} revision={}",
            mutation.op_name(),
            self.revision
        );
        Ok(&self.current)
    }

    /// Applies all mutations in order, or none of them.
    ///
    /// Later mutations address the snapshot produced by earlier ones.
    pub fn apply_batch(&mut self, mutations: &[OutlineMutation]) -> Result<&Outline, StoreError> {
        self.ensure_idle("batch")?;
        if mutations.len() > self.config.max_batch_len {
            return Err(StoreError::BatchTooLarge {
                len: mutations.len(),
                max: self.config.max_batch_len,
            });
        }

        let mut working = self.current.clone();
        for (index, mutation) in mutations.iter().enumerate() {
            working = mutation.apply(&working).map_err(|err| {
                warn!(
                    "event=outline_batch module=store status=error op={} index={} len={} error={}",
                    mutation.op_name(),
                    index,
                    mutations.len(),
                    err
                );
                StoreError::Outline(err)
            })?;
        }

        if !mutations.is_empty() {
            self.current = working;
            self.revision += 1;
        }
        info!(
            "event=outline_batch module=store status=ok len={} revision={}",
            mutations.len(),
            self.revision
        );
        Ok(&self.current)
    }

    /// Rolls the current snapshot back to the committed one.
    pub fn discard_changes(&mut self) -> Result<&Outline, StoreError> {
        self.ensure_idle("discard")?;
        if self.is_dirty() {
            self.current = self.committed.clone();
            self.mark_committed_new_revision();
            info!(
                "event=outline_discard module=store status=ok revision={}",
                self.revision
            );
        }
        Ok(&self.current)
    }

    /// Replaces state wholesale with an inbound snapshot.
    pub fn replace(&mut self, outline: Outline) -> Result<&Outline, StoreError> {
        self.ensure_idle("replace")?;
        self.install(outline)
    }

    /// Marks a pull as outstanding.
    pub fn begin_fetch(&mut self) -> Result<(), StoreError> {
        self.ensure_idle("fetch")?;
        self.sync_state = SyncState::Fetching;
        debug!("event=outline_fetch module=store status=start");
        Ok(())
    }

    /// Completes the outstanding pull with the provider's result.
    ///
    /// A successful pull replaces the snapshot; a failed or invalid pull keeps
    /// the previous one.
    pub fn finish_fetch(
        &mut self,
        result: Result<Outline, SyncError>,
    ) -> Result<&Outline, StoreError> {
        if self.sync_state != SyncState::Fetching {
            return Err(StoreError::NoPendingSync);
        }
        self.sync_state = SyncState::Idle;

        match result {
            Ok(outline) => self.install(outline),
            Err(err) => {
                warn!(
                    "event=outline_fetch module=store status=error error={}",
                    err
                );
                Err(StoreError::Sync(err))
            }
        }
    }

    /// Marks a push of the current snapshot as outstanding.
    pub fn begin_save(&mut self) -> Result<SaveTicket, StoreError> {
        self.ensure_idle("save")?;
        self.sync_state = SyncState::Saving {
            revision: self.revision,
        };
        debug!(
            "event=outline_save module=store status=start revision={}",
            self.revision
        );
        Ok(SaveTicket {
            revision: self.revision,
            snapshot: self.current.clone(),
        })
    }

    /// Completes the outstanding push; on success the ticket's snapshot
    /// becomes the committed one.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), SyncError>,
    ) -> Result<(), StoreError> {
        let SyncState::Saving { revision } = self.sync_state else {
            return Err(StoreError::NoPendingSync);
        };
        if revision != ticket.revision {
            return Err(StoreError::StaleSaveTicket {
                expected: revision,
                found: ticket.revision,
            });
        }
        self.sync_state = SyncState::Idle;

        match result {
            Ok(()) => {
                self.committed = ticket.snapshot;
                self.committed_revision = ticket.revision;
                info!(
                    "event=outline_save module=store status=ok revision={}",
                    ticket.revision
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=outline_save module=store status=error revision={} error={}",
                    ticket.revision, err
                );
                Err(StoreError::Sync(err))
            }
        }
    }

    /// Pulls from `provider` and replaces the snapshot.
    pub fn reload(&mut self, provider: &dyn SyncProvider) -> Result<&Outline, StoreError> {
        self.begin_fetch()?;
        debug!(
            "event=outline_fetch module=store status=pending provider={}",
            provider.provider_id()
        );
        let result = provider.pull();
        self.finish_fetch(result)
    }

    /// Pushes the current snapshot to `provider` and marks it committed.
    pub fn commit(&mut self, provider: &dyn SyncProvider) -> Result<(), StoreError> {
        let ticket = self.begin_save()?;
        debug!(
            "event=outline_save module=store status=pending provider={}",
            provider.provider_id()
        );
        let result = provider.push(ticket.snapshot());
        self.finish_save(ticket, result)
    }

    fn install(&mut self, outline: Outline) -> Result<&Outline, StoreError> {
        let prepared = prepare_snapshot(outline, self.config.load_policy).map_err(|err| {
            warn!(
                "event=outline_replace module=store status=rejected error={}",
                err
            );
            StoreError::Outline(err)
        })?;

        self.current = prepared.clone();
        self.committed = prepared;
        self.mark_committed_new_revision();
        info!(
            "event=outline_replace module=store status=ok nodes={} revision={}",
            self.current.node_count(),
            self.revision
        );
        Ok(&self.current)
    }

    fn mark_committed_new_revision(&mut self) {
        self.revision += 1;
        self.committed_revision = self.revision;
    }

    fn ensure_idle(&self, op: &str) -> Result<(), StoreError> {
        if self.sync_state == SyncState::Idle {
            return Ok(());
        }
        warn!(
            "event=outline_mutation module=store status=rejected op={} reason=sync_in_progress",
            op
        );
        Err(StoreError::SyncInProgress(self.sync_state))
    }
}

fn prepare_snapshot(mut outline: Outline, policy: LoadPolicy) -> Result<Outline, OutlineError> {
    outline.validate()?;
    match policy {
        LoadPolicy::Normalize => order::normalize_outline(&mut outline),
        LoadPolicy::Strict => outline.check_orders()?,
    }
    Ok(outline)
}
