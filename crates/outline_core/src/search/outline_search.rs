//! Hierarchy-preserving keyword search over outline snapshots.
//!
//! # Responsibility
//! - Filter an outline down to matching nodes plus their ancestor chains.
//! - List individual name hits with their paths for jump-to navigation.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test on `name` at every level.
//! - A node is kept iff its name matches or a descendant is kept.
//! - A kept node always carries the filtered children, never the originals
//!   (unless every child was kept unchanged).
//! - Every filtered collection is renumbered `1..N`, so a search result
//!   passes the same order checks as a live snapshot.
//! - Blank keywords leave the outline unmodified.

use crate::model::node::{NodeId, NodeKind, Outline, OutlineNode};
use crate::model::path::NodePath;
use crate::tree::order;
use log::warn;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Keywords are truncated to this many characters before compiling.
pub const MAX_KEYWORD_CHARS: usize = 256;

/// Compiled case-insensitive substring matcher.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    inner: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Blank,
    Pattern(Regex),
    /// Keyword that could not be compiled; matches no name.
    Unmatchable,
}

impl KeywordMatcher {
    /// Builds a matcher for the trimmed `keyword`.
    ///
    /// Only the first [`MAX_KEYWORD_CHARS`] characters are used, which keeps
    /// the compiled pattern within regex size limits. A keyword that still
    /// fails to compile matches nothing.
    pub fn new(keyword: &str) -> Self {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return Self {
                inner: Matcher::Blank,
            };
        }

        let capped = match trimmed.char_indices().nth(MAX_KEYWORD_CHARS) {
            Some((end, _)) => &trimmed[..end],
            None => trimmed,
        };
        let inner = match RegexBuilder::new(&regex::escape(capped))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => Matcher::Pattern(pattern),
            Err(err) => {
                warn!("event=search_keyword module=search status=error error={err}");
                Matcher::Unmatchable
            }
        };
        Self { inner }
    }

    /// Returns whether the keyword was blank after trim.
    pub fn is_blank(&self) -> bool {
        matches!(self.inner, Matcher::Blank)
    }

    /// Returns whether `name` contains the keyword. Blank keywords match nothing.
    pub fn matches(&self, name: &str) -> bool {
        match &self.inner {
            Matcher::Blank | Matcher::Unmatchable => false,
            Matcher::Pattern(pattern) => pattern.is_match(name),
        }
    }
}

/// Single name hit returned by [`search_hits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub path: NodePath,
}

/// Filters `outline` to nodes matching `keyword` plus their ancestors.
///
/// Depth-first post-order, each node visited once. Returns the outline
/// unmodified for blank keywords. Kept siblings are renumbered `1..N` in
/// their original relative order.
pub fn search(outline: &Outline, keyword: &str) -> Outline {
    let matcher = KeywordMatcher::new(keyword);
    if matcher.is_blank() {
        return outline.clone();
    }
    Outline {
        sections: filter_collection(&outline.sections, &matcher),
    }
}

/// Lists every node whose own name matches `keyword`, in pre-order.
///
/// Returns an empty list for blank keywords.
pub fn search_hits(outline: &Outline, keyword: &str) -> Vec<SearchHit> {
    let matcher = KeywordMatcher::new(keyword);
    let mut hits = Vec::new();
    if matcher.is_blank() {
        return hits;
    }

    outline.walk(|path, node| {
        if matcher.matches(&node.name) {
            hits.push(SearchHit {
                node_id: node.id,
                kind: node.kind(),
                name: node.name.clone(),
                path: path.clone(),
            });
        }
    });
    hits
}

fn filter_collection(
    nodes: &[Arc<OutlineNode>],
    matcher: &KeywordMatcher,
) -> Vec<Arc<OutlineNode>> {
    let mut kept: Vec<_> = nodes
        .iter()
        .filter_map(|node| filter_node(node, matcher))
        .collect();
    order::renumber(&mut kept);
    kept
}

fn filter_node(node: &Arc<OutlineNode>, matcher: &KeywordMatcher) -> Option<Arc<OutlineNode>> {
    let children = filter_collection(&node.children, matcher);
    if children.is_empty() && !matcher.matches(&node.name) {
        return None;
    }

    let untouched = children.len() == node.children.len()
        && children
            .iter()
            .zip(&node.children)
            .all(|(kept, original)| Arc::ptr_eq(kept, original));
    if untouched {
        return Some(Arc::clone(node));
    }

    Some(Arc::new(OutlineNode {
        id: node.id,
        name: node.name.clone(),
        order: node.order,
        detail: node.detail.clone(),
        children,
    }))
}
