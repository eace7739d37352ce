//! Core outline engine for channel authoring.
//! This crate is the single source of truth for outline tree invariants.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod sync;
pub mod tree;

pub use config::{ConfigError, LoadPolicy, LogConfig, OutlineConfig, StoreConfig};
pub use error::{OutlineError, OutlineResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::node::{ContentKind, NodeDetail, NodeId, NodeKind, Outline, OutlineNode};
pub use model::path::{NodePath, ParsePathError};
pub use search::outline_search::{search, search_hits, KeywordMatcher, SearchHit};
pub use service::outline_store::{OutlineStore, SaveTicket, StoreError, SyncState};
pub use sync::provider::{MemorySyncProvider, SyncError, SyncProvider};
pub use tree::mutator::{insert, move_node, remove, rename, take, OutlineMutation};
pub use tree::order::{is_contiguous, reorder};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
