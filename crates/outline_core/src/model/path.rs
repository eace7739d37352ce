//! Root-to-node index paths.
//!
//! A path is the list of child indices walked from the outline root. The
//! empty path denotes the root collection (the section list) itself.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Index path locating one node (or the root) inside an outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the root collection.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of steps from the root; sections have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns the path of child `index` below this path.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.split_last().map(|(parent, _)| parent)
    }

    /// Returns the index within the parent collection, or `None` for the root.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Splits into parent path and index within that parent.
    pub fn split_last(&self) -> Option<(Self, usize)> {
        let (last, head) = self.0.split_last()?;
        Some((Self(head.to_vec()), *last))
    }

    /// Returns whether `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Error for path strings that are not `/`-separated indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePathError {
    pub input: String,
}

impl Display for ParsePathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid node path `{}`; expected e.g. `/0/2`", self.input)
    }
}

impl Error for ParsePathError {}

impl FromStr for NodePath {
    type Err = ParsePathError;

    /// Parses `/0/2/1`. Both `` and `/` parse to the root path.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if body.is_empty() {
            return Ok(Self::root());
        }

        body.split('/')
            .map(|segment| segment.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| ParsePathError {
                input: value.to_string(),
            })
    }
}
