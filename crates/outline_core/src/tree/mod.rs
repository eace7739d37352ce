//! Outline tree algorithms.
//!
//! # Responsibility
//! - Keep sibling collections contiguously ordered (`order`).
//! - Apply structural edits as pure snapshot-to-snapshot functions (`mutator`).
//!
//! # Invariants
//! - After any successful edit every sibling collection is numbered `1..N`.
//! - Node ids stay unique across the whole outline.

pub mod mutator;
pub mod order;
