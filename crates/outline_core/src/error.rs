//! Outline engine error model.
//!
//! # Responsibility
//! - Define the recoverable error kinds raised by tree operations.
//! - Keep error messages metadata-only (paths, ids, counts).
//!
//! # Invariants
//! - No variant carries user-authored text such as names or payloads.
//! - Every failing operation leaves its input snapshot untouched.

use crate::model::node::{NodeId, NodeKind};
use crate::model::path::NodePath;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by model, order and mutator operations.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Errors from outline tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// Path does not resolve to an existing node (or collection).
    NotFound(NodePath),
    /// Node id already exists somewhere in the outline.
    DuplicateId(NodeId),
    /// Move destination equals or lies inside the moved subtree.
    CyclicMove { from: NodePath, to_parent: NodePath },
    /// Order maintainer received a negative (or overflowing) offset.
    InvalidOffset(i64),
    /// Child kind is not allowed under the parent kind. `None` is the root.
    InvalidChildLevel {
        parent: Option<NodeKind>,
        child: NodeKind,
    },
    /// Node name is blank after trim.
    InvalidName,
    /// Sibling collection under `path` is not numbered `1..N`.
    InvalidOrder {
        path: NodePath,
        expected: i64,
        found: i64,
    },
    /// Externally supplied id is the nil uuid.
    NilId,
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "outline node not found at path {path}"),
            Self::DuplicateId(id) => write!(f, "outline node id already exists: {id}"),
            Self::CyclicMove { from, to_parent } => write!(
                f,
                "move would create cycle: node {from} under parent {to_parent}"
            ),
            Self::InvalidOffset(offset) => {
                write!(f, "order offset must be non-negative, got {offset}")
            }
            Self::InvalidChildLevel { parent, child } => match parent {
                Some(parent) => write!(f, "{child} cannot be placed under {parent}"),
                None => write!(f, "{child} cannot be placed at outline root"),
            },
            Self::InvalidName => write!(f, "node name must not be blank"),
            Self::InvalidOrder {
                path,
                expected,
                found,
            } => write!(
                f,
                "children of {path} are not contiguous: expected order {expected}, found {found}"
            ),
            Self::NilId => write!(f, "node id must not be nil"),
        }
    }
}

impl Error for OutlineError {}
