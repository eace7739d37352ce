//! Flutter-facing bindings for the outline engine.

pub mod api;
