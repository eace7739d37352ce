//! Pure structural edits over outline snapshots.
//!
//! # Responsibility
//! - Provide insert, remove, move and rename operations addressed by path.
//! - Re-establish contiguous sibling order after every structural change.
//!
//! # Invariants
//! - Inputs are never mutated; every operation returns a new snapshot.
//! - Only nodes on the edited path are copied; other subtrees are shared.
//! - A failing operation applies nothing.
//! - Moves never place a node inside its own subtree.

use crate::error::{OutlineError, OutlineResult};
use crate::model::node::{slot_accepts, NodeKind, Outline, OutlineNode};
use crate::model::path::NodePath;
use crate::tree::order;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One edit request, as issued by UI callers or replayed in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutlineMutation {
    Insert {
        parent: NodePath,
        node: OutlineNode,
        #[serde(default)]
        at_index: Option<usize>,
    },
    Remove {
        path: NodePath,
    },
    Move {
        from: NodePath,
        to_parent: NodePath,
        to_index: usize,
    },
    Rename {
        path: NodePath,
        name: String,
    },
}

impl OutlineMutation {
    /// Applies this edit to `outline`, returning the edited snapshot.
    pub fn apply(&self, outline: &Outline) -> OutlineResult<Outline> {
        match self {
            Self::Insert {
                parent,
                node,
                at_index,
            } => insert(outline, parent, node.clone(), *at_index),
            Self::Remove { path } => remove(outline, path),
            Self::Move {
                from,
                to_parent,
                to_index,
            } => move_node(outline, from, to_parent, *to_index),
            Self::Rename { path, name } => rename(outline, path, name),
        }
    }

    /// Stable operation label for diagnostics.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::Move { .. } => "move",
            Self::Rename { .. } => "rename",
        }
    }
}

/// Inserts `node` under `parent` at `at_index` (default: end).
///
/// Indices past the end are clamped to the end. The node's name is trimmed
/// and its own subtree is renumbered before it is spliced in.
///
/// # Errors
/// - [`OutlineError::InvalidName`] when the name is blank.
/// - [`OutlineError::NotFound`] when `parent` does not resolve.
/// - [`OutlineError::InvalidChildLevel`] when the node kind (or any kind in
///   its subtree) does not fit.
/// - [`OutlineError::DuplicateId`] when any id of the subtree already exists
///   in the outline or repeats inside the subtree.
pub fn insert(
    outline: &Outline,
    parent: &NodePath,
    mut node: OutlineNode,
    at_index: Option<usize>,
) -> OutlineResult<Outline> {
    node.name = normalize_name(&node.name)?;
    let parent_kind = resolve_slot(outline, parent)?;
    ensure_fits(parent_kind, node.kind())?;
    node.validate_levels()?;
    ensure_fresh_ids(outline, &node)?;

    let mut node = Arc::new(node);
    order::normalize_subtree(&mut node);

    let mut next = outline.clone();
    let siblings = children_mut(&mut next, parent)?;
    let index = at_index.map_or(siblings.len(), |index| index.min(siblings.len()));
    siblings.insert(index, node);
    order::renumber(siblings);
    Ok(next)
}

/// Removes the node at `path` together with its subtree.
///
/// # Errors
/// - [`OutlineError::NotFound`] when `path` does not resolve (or is root).
pub fn remove(outline: &Outline, path: &NodePath) -> OutlineResult<Outline> {
    take(outline, path).map(|(next, _)| next)
}

/// Removes the node at `path`, returning the new snapshot and the removed node.
pub fn take(outline: &Outline, path: &NodePath) -> OutlineResult<(Outline, Arc<OutlineNode>)> {
    let (parent, index) = path
        .split_last()
        .ok_or_else(|| OutlineError::NotFound(path.clone()))?;
    if outline.get(path).is_none() {
        return Err(OutlineError::NotFound(path.clone()));
    }

    let mut next = outline.clone();
    let siblings = children_mut(&mut next, &parent)?;
    let removed = siblings.remove(index);
    order::renumber(siblings);
    Ok((next, removed))
}

/// Moves the node at `from` under `to_parent` at `to_index`.
///
/// `to_parent` is resolved in the input snapshot. `to_index` indexes the
/// destination collection after the node has left its old position and is
/// clamped to its end.
///
/// # Errors
/// - [`OutlineError::NotFound`] when either path does not resolve.
/// - [`OutlineError::CyclicMove`] when `to_parent` equals or lies below `from`.
/// - [`OutlineError::InvalidChildLevel`] when the node kind does not fit.
pub fn move_node(
    outline: &Outline,
    from: &NodePath,
    to_parent: &NodePath,
    to_index: usize,
) -> OutlineResult<Outline> {
    let moving_kind = outline
        .get(from)
        .map(|node| node.kind())
        .ok_or_else(|| OutlineError::NotFound(from.clone()))?;
    let parent_kind = resolve_slot(outline, to_parent)?;
    if from.is_prefix_of(to_parent) {
        return Err(OutlineError::CyclicMove {
            from: from.clone(),
            to_parent: to_parent.clone(),
        });
    }
    ensure_fits(parent_kind, moving_kind)?;

    let (mut next, node) = take(outline, from)?;
    let destination = shift_after_removal(from, to_parent);
    let siblings = children_mut(&mut next, &destination)?;
    let index = to_index.min(siblings.len());
    siblings.insert(index, node);
    order::renumber(siblings);
    Ok(next)
}

/// Replaces the name of the node at `path`. Order and children are kept.
///
/// # Errors
/// - [`OutlineError::InvalidName`] when `name` is blank.
/// - [`OutlineError::NotFound`] when `path` does not resolve.
pub fn rename(outline: &Outline, path: &NodePath, name: &str) -> OutlineResult<Outline> {
    let name = normalize_name(name)?;
    let (parent, index) = path
        .split_last()
        .ok_or_else(|| OutlineError::NotFound(path.clone()))?;
    if outline.get(path).is_none() {
        return Err(OutlineError::NotFound(path.clone()));
    }

    let mut next = outline.clone();
    let siblings = children_mut(&mut next, &parent)?;
    let node = siblings
        .get_mut(index)
        .ok_or_else(|| OutlineError::NotFound(path.clone()))?;
    Arc::make_mut(node).name = name;
    Ok(next)
}

fn normalize_name(value: &str) -> OutlineResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OutlineError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn resolve_slot(outline: &Outline, path: &NodePath) -> OutlineResult<Option<NodeKind>> {
    outline
        .slot_kind(path)
        .ok_or_else(|| OutlineError::NotFound(path.clone()))
}

fn ensure_fits(parent: Option<NodeKind>, child: NodeKind) -> OutlineResult<()> {
    if slot_accepts(parent, child) {
        Ok(())
    } else {
        Err(OutlineError::InvalidChildLevel { parent, child })
    }
}

fn ensure_fresh_ids(outline: &Outline, node: &OutlineNode) -> OutlineResult<()> {
    let existing = outline.ids();
    let mut incoming = HashSet::new();
    let mut collision = None;
    node.visit_ids(&mut |id| {
        if collision.is_none() && (existing.contains(&id) || !incoming.insert(id)) {
            collision = Some(id);
        }
    });
    match collision {
        Some(id) => Err(OutlineError::DuplicateId(id)),
        None => Ok(()),
    }
}

/// Rewrites `path` (taken before `removed` left its collection) so that it
/// addresses the same node afterwards.
fn shift_after_removal(removed: &NodePath, path: &NodePath) -> NodePath {
    let Some((removed_parent, removed_index)) = removed.split_last() else {
        return path.clone();
    };
    let depth = removed_parent.depth();
    if !removed_parent.is_prefix_of(path) || path.depth() <= depth {
        return path.clone();
    }

    let mut indices = path.indices().to_vec();
    if indices[depth] > removed_index {
        indices[depth] -= 1;
    }
    NodePath::new(indices)
}

/// Mutable access to the collection at `path`, copying nodes on the way down.
fn children_mut<'a>(
    outline: &'a mut Outline,
    path: &NodePath,
) -> OutlineResult<&'a mut Vec<Arc<OutlineNode>>> {
    let mut children = &mut outline.sections;
    for &index in path.indices() {
        let node = children
            .get_mut(index)
            .ok_or_else(|| OutlineError::NotFound(path.clone()))?;
        children = &mut Arc::make_mut(node).children;
    }
    Ok(children)
}
