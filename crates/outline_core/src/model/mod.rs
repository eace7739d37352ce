//! Channel outline domain model.
//!
//! # Responsibility
//! - Define the canonical tree shape exchanged with UI and sync collaborators.
//! - Locate nodes by root-to-node paths instead of stored parent links.
//!
//! # Invariants
//! - Every node is identified by a stable, outline-wide unique `NodeId`.
//! - Snapshots are immutable values; edits produce new snapshots.

pub mod node;
pub mod path;
