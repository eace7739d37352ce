//! Sibling order maintenance.
//!
//! # Responsibility
//! - Renumber a sibling collection into `offset+1..offset+N` by position.
//! - Normalize whole subtrees after insert or snapshot load.
//!
//! # Invariants
//! - Never re-sorts: traversal position is the only ordering key.
//! - Nodes that already carry the right order are shared, not cloned.
//! - Negative offsets are rejected, never clamped.

use crate::error::{OutlineError, OutlineResult};
use crate::model::node::{Outline, OutlineNode};
use std::sync::Arc;

/// Returns `siblings` renumbered to `offset + 1, offset + 2, ...`.
///
/// # Errors
/// - [`OutlineError::InvalidOffset`] when `offset` is negative or the last
///   order would overflow `i64`.
pub fn reorder(
    siblings: &[Arc<OutlineNode>],
    offset: i64,
) -> OutlineResult<Vec<Arc<OutlineNode>>> {
    ensure_offset(offset, siblings.len())?;
    let mut renumbered = siblings.to_vec();
    assign_orders(&mut renumbered, offset);
    Ok(renumbered)
}

/// Returns whether `siblings` are already numbered from `offset + 1`.
pub fn is_contiguous(siblings: &[Arc<OutlineNode>], offset: i64) -> bool {
    if ensure_offset(offset, siblings.len()).is_err() {
        return false;
    }
    siblings
        .iter()
        .zip(offset + 1..)
        .all(|(node, expected)| node.order == expected)
}

/// Renumbers every collection in the outline to `1..N`.
pub fn normalize_outline(outline: &mut Outline) {
    normalize_collection(&mut outline.sections);
}

/// Renumbers every collection below `node` to `1..N`.
///
/// The node's own order is left to its future parent collection.
pub fn normalize_subtree(node: &mut Arc<OutlineNode>) {
    if !subtree_is_normalized(node) {
        normalize_collection(&mut Arc::make_mut(node).children);
    }
}

/// Infallible `1..N` renumbering used after structural edits.
pub(crate) fn renumber(siblings: &mut [Arc<OutlineNode>]) {
    assign_orders(siblings, 0);
}

fn normalize_collection(siblings: &mut [Arc<OutlineNode>]) {
    for node in siblings.iter_mut() {
        normalize_subtree(node);
    }
    renumber(siblings);
}

fn subtree_is_normalized(node: &OutlineNode) -> bool {
    is_contiguous(&node.children, 0)
        && node
            .children
            .iter()
            .all(|child| subtree_is_normalized(child))
}

fn assign_orders(siblings: &mut [Arc<OutlineNode>], offset: i64) {
    for (node, expected) in siblings.iter_mut().zip(offset + 1..) {
        if node.order != expected {
            Arc::make_mut(node).order = expected;
        }
    }
}

fn ensure_offset(offset: i64, len: usize) -> OutlineResult<()> {
    if offset < 0 {
        return Err(OutlineError::InvalidOffset(offset));
    }
    i64::try_from(len)
        .ok()
        .and_then(|len| offset.checked_add(len))
        .and_then(|last| last.checked_add(1))
        .map(|_| ())
        .ok_or(OutlineError::InvalidOffset(offset))
}
