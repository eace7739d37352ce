//! Remote-sync integration points.

pub mod provider;
