//! Outline node model.
//!
//! # Responsibility
//! - Define the section/unit/activity/content vocabulary as one shared node
//!   shape with a closed set of kind-specific details.
//! - Provide read-only snapshot queries (lookup by path or id, traversal,
//!   structural validation).
//!
//! # Invariants
//! - `id` is unique across the whole outline, not only among siblings.
//! - Parents own children by value (`Arc`); there are no parent back-pointers.
//! - Child kinds follow [`NodeKind::accepts_child`]; the root holds sections.
//! - Content payloads are opaque and never interpreted by the engine.

use crate::error::{OutlineError, OutlineResult};
use crate::model::path::NodePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Stable outline node identifier.
pub type NodeId = Uuid;

/// Fieldless tag for the four outline levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Unit,
    Activity,
    Content,
}

impl NodeKind {
    /// Returns whether `child` may appear directly under this kind.
    ///
    /// Content items may nest (folder-like grouping); every other level only
    /// accepts the next level down.
    pub fn accepts_child(self, child: NodeKind) -> bool {
        matches!(
            (self, child),
            (Self::Section, Self::Unit)
                | (Self::Unit, Self::Activity)
                | (Self::Activity, Self::Content)
                | (Self::Content, Self::Content)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Unit => "unit",
            Self::Activity => "activity",
            Self::Content => "content",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns whether a parent slot accepts `child`. `None` is the outline root.
pub fn slot_accepts(parent: Option<NodeKind>, child: NodeKind) -> bool {
    match parent {
        Some(parent) => parent.accepts_child(child),
        None => child == NodeKind::Section,
    }
}

/// Content item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    LessonItem,
    QuizItem,
}

/// Kind-specific node fields.
///
/// Serialized as `level` tag flattened into the node object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NodeDetail {
    Section,
    Unit,
    Activity {
        /// Reference to the lesson/quiz document backing this activity.
        #[serde(default)]
        content_ref: Option<String>,
    },
    Content {
        kind: ContentKind,
        /// Opaque blob owned by the lesson/quiz editors.
        #[serde(default)]
        payload: Value,
    },
}

impl NodeDetail {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Section => NodeKind::Section,
            Self::Unit => NodeKind::Unit,
            Self::Activity { .. } => NodeKind::Activity,
            Self::Content { .. } => NodeKind::Content,
        }
    }
}

/// One outline node: shared `{id, name, order, children}` shape plus detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: NodeId,
    pub name: String,
    /// 1-based position within the parent collection.
    #[serde(default)]
    pub order: i64,
    #[serde(flatten)]
    pub detail: NodeDetail,
    #[serde(default)]
    pub children: Vec<Arc<OutlineNode>>,
}

impl OutlineNode {
    /// Creates a node with a generated id, order `0` and no children.
    ///
    /// Order is assigned when the node is inserted into a collection.
    pub fn new(detail: NodeDetail, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            order: 0,
            detail,
            children: Vec::new(),
        }
    }

    /// Creates a node with a caller-provided id.
    ///
    /// Used by import/sync paths where identity already exists remotely.
    ///
    /// # Errors
    /// - [`OutlineError::NilId`] when `id` is the nil uuid.
    pub fn with_id(id: NodeId, detail: NodeDetail, name: impl Into<String>) -> OutlineResult<Self> {
        if id.is_nil() {
            return Err(OutlineError::NilId);
        }
        let mut node = Self::new(detail, name);
        node.id = id;
        Ok(node)
    }

    pub fn section(name: impl Into<String>) -> Self {
        Self::new(NodeDetail::Section, name)
    }

    pub fn unit(name: impl Into<String>) -> Self {
        Self::new(NodeDetail::Unit, name)
    }

    pub fn activity(name: impl Into<String>, content_ref: Option<String>) -> Self {
        Self::new(NodeDetail::Activity { content_ref }, name)
    }

    pub fn content(name: impl Into<String>, kind: ContentKind, payload: Value) -> Self {
        Self::new(NodeDetail::Content { kind, payload }, name)
    }

    /// Replaces children, numbering them `1..N` in iteration order.
    ///
    /// Levels are not checked here; see [`Outline::validate`].
    pub fn with_children(mut self, children: impl IntoIterator<Item = OutlineNode>) -> Self {
        self.children = numbered(children);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.detail.kind()
    }

    pub fn children(&self) -> &[Arc<OutlineNode>] {
        &self.children
    }

    /// Returns the content payload, if this is a content item.
    pub fn payload(&self) -> Option<&Value> {
        match &self.detail {
            NodeDetail::Content { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn content_kind(&self) -> Option<ContentKind> {
        match &self.detail {
            NodeDetail::Content { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.subtree_len())
            .sum::<usize>()
    }

    /// Checks the child-kind rule for every edge inside this subtree.
    pub fn validate_levels(&self) -> OutlineResult<()> {
        for child in &self.children {
            if !self.kind().accepts_child(child.kind()) {
                return Err(OutlineError::InvalidChildLevel {
                    parent: Some(self.kind()),
                    child: child.kind(),
                });
            }
            child.validate_levels()?;
        }
        Ok(())
    }

    pub(crate) fn visit_ids(&self, visit: &mut impl FnMut(NodeId)) {
        visit(self.id);
        for child in &self.children {
            child.visit_ids(visit);
        }
    }
}

/// Full channel outline snapshot.
///
/// Cloning is cheap: only the top-level `Arc` handles are copied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub sections: Vec<Arc<OutlineNode>>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an outline, numbering sections `1..N` in iteration order.
    pub fn from_sections(sections: impl IntoIterator<Item = OutlineNode>) -> Self {
        Self {
            sections: numbered(sections),
        }
    }

    pub fn sections(&self) -> &[Arc<OutlineNode>] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Resolves `path` to a node. The root path resolves to `None`.
    pub fn get(&self, path: &NodePath) -> Option<&Arc<OutlineNode>> {
        let (parent, index) = path.split_last()?;
        self.children_at(&parent)?.get(index)
    }

    /// Resolves `path` to the child collection owned by that node (or root).
    pub fn children_at(&self, path: &NodePath) -> Option<&[Arc<OutlineNode>]> {
        let mut children = self.sections.as_slice();
        for &index in path.indices() {
            children = children.get(index)?.children.as_slice();
        }
        Some(children)
    }

    /// Returns the kind owning the collection at `path`.
    ///
    /// `Some(None)` is the root; `None` means the path does not resolve.
    pub fn slot_kind(&self, path: &NodePath) -> Option<Option<NodeKind>> {
        if path.is_root() {
            return Some(None);
        }
        self.get(path).map(|node| Some(node.kind()))
    }

    /// Finds the root-to-node path of `id` by depth-first search.
    pub fn find_path(&self, id: NodeId) -> Option<NodePath> {
        fn find_in(
            children: &[Arc<OutlineNode>],
            id: NodeId,
            path: &mut Vec<usize>,
        ) -> bool {
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                if child.id == id || find_in(&child.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        find_in(&self.sections, id, &mut path).then(|| NodePath::new(path))
    }

    pub fn contains_id(&self, id: NodeId) -> bool {
        self.find_path(id).is_some()
    }

    /// Total number of nodes at every level.
    pub fn node_count(&self) -> usize {
        self.sections.iter().map(|section| section.subtree_len()).sum()
    }

    /// Collects every node id in the outline.
    pub fn ids(&self) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        for section in &self.sections {
            section.visit_ids(&mut |id| {
                ids.insert(id);
            });
        }
        ids
    }

    /// Visits every node in pre-order together with its path.
    pub fn walk(&self, mut visit: impl FnMut(&NodePath, &OutlineNode)) {
        fn walk_in(
            children: &[Arc<OutlineNode>],
            path: &NodePath,
            visit: &mut impl FnMut(&NodePath, &OutlineNode),
        ) {
            for (index, child) in children.iter().enumerate() {
                let child_path = path.child(index);
                visit(&child_path, child);
                walk_in(&child.children, &child_path, visit);
            }
        }

        walk_in(&self.sections, &NodePath::root(), &mut visit);
    }

    /// Checks id presence, id uniqueness and the child-kind rule across the
    /// outline.
    ///
    /// # Errors
    /// - [`OutlineError::InvalidChildLevel`] for the first misplaced node.
    /// - [`OutlineError::NilId`] when any node carries the nil uuid.
    /// - [`OutlineError::DuplicateId`] for the first repeated id.
    pub fn validate(&self) -> OutlineResult<()> {
        for section in &self.sections {
            if section.kind() != NodeKind::Section {
                return Err(OutlineError::InvalidChildLevel {
                    parent: None,
                    child: section.kind(),
                });
            }
            section.validate_levels()?;
        }

        let mut seen = HashSet::new();
        let mut duplicate = None;
        let mut has_nil = false;
        for section in &self.sections {
            section.visit_ids(&mut |id| {
                has_nil |= id.is_nil();
                if !seen.insert(id) && duplicate.is_none() {
                    duplicate = Some(id);
                }
            });
        }
        if has_nil {
            return Err(OutlineError::NilId);
        }
        match duplicate {
            Some(id) => Err(OutlineError::DuplicateId(id)),
            None => Ok(()),
        }
    }

    /// Checks that every sibling collection is numbered `1..N`.
    ///
    /// # Errors
    /// - [`OutlineError::InvalidOrder`] naming the first offending collection.
    pub fn check_orders(&self) -> OutlineResult<()> {
        fn check_in(children: &[Arc<OutlineNode>], path: &NodePath) -> OutlineResult<()> {
            for (expected, child) in (1_i64..).zip(children) {
                if child.order != expected {
                    return Err(OutlineError::InvalidOrder {
                        path: path.clone(),
                        expected,
                        found: child.order,
                    });
                }
            }
            for (index, child) in children.iter().enumerate() {
                check_in(&child.children, &path.child(index))?;
            }
            Ok(())
        }

        check_in(&self.sections, &NodePath::root())
    }
}

fn numbered(nodes: impl IntoIterator<Item = OutlineNode>) -> Vec<Arc<OutlineNode>> {
    (1_i64..)
        .zip(nodes)
        .map(|(order, mut node)| {
            node.order = order;
            Arc::new(node)
        })
        .collect()
}
