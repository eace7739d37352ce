//! Outline search entry points.
//!
//! # Responsibility
//! - Expose keyword filtering over in-memory outline snapshots.
//! - Keep result shaping (subset trees, hit lists) inside core.

pub mod outline_search;
