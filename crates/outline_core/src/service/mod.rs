//! Core use-case services.
//!
//! # Responsibility
//! - Own the editing session state and orchestrate tree algorithms.
//! - Keep UI/FFI layers decoupled from tree and sync details.

pub mod outline_store;
