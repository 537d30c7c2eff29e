//! Graph Row Model
//!
//! Flat, denormalized rows produced by a recursive traversal of a link table.
//! One row is emitted per (node, link) pair reached from the traversal roots,
//! so the same node can show up several times when it is linked into more
//! than one place (for example as a bound mirror).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a folder or task
pub type NodeId = i64;

/// Identifier of a single link (edge) record
pub type LinkId = i64;

/// Identifier of a space (top-level container of a folder forest)
pub type SpaceId = i64;

/// Delimiter used when a path is rendered as text
pub const PATH_DELIMITER: char = ',';

/// Which of the two hierarchies a row or link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// Folder containment inside a space (supports bound mirrors)
    Folder,
    /// Task parent/child relations
    Task,
}

impl RelationKind {
    /// Whether bound links participate in cycle checks for this hierarchy
    pub fn uses_bound_links(&self) -> bool {
        matches!(self, RelationKind::Folder)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Folder => "folder",
            RelationKind::Task => "task",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered sequence of link ids from a traversal root to a row
///
/// Replaces string-encoded paths: membership checks are done on the ids
/// themselves and the parent path is a slice away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkPath(Vec<LinkId>);

impl LinkPath {
    /// Path of a traversal root reached through `link_id`
    pub fn root(link_id: LinkId) -> Self {
        Self(vec![link_id])
    }

    pub fn from_links(links: impl IntoIterator<Item = LinkId>) -> Self {
        Self(links.into_iter().collect())
    }

    /// Path one hop longer than `self`
    pub fn push(&self, link_id: LinkId) -> Self {
        let mut links = Vec::with_capacity(self.0.len() + 1);
        links.extend_from_slice(&self.0);
        links.push(link_id);
        Self(links)
    }

    /// Path of the row that produced this one (empty for a root)
    pub fn parent(&self) -> LinkPath {
        match self.0.split_last() {
            Some((_, rest)) => Self(rest.to_vec()),
            None => Self::default(),
        }
    }

    /// True if the link was already traversed along this path
    pub fn contains(&self, link_id: LinkId) -> bool {
        self.0.contains(&link_id)
    }

    pub fn last(&self) -> Option<LinkId> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn links(&self) -> &[LinkId] {
        &self.0
    }
}

impl fmt::Display for LinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for link in &self.0 {
            if !first {
                write!(f, "{}", PATH_DELIMITER)?;
            }
            write!(f, "{}", link)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for LinkPath {
    type Err = std::num::ParseIntError;

    /// Parse the rendered form (`"1,4,9"`); an empty string is the empty path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        trimmed
            .split(PATH_DELIMITER)
            .map(|segment| segment.trim().parse::<LinkId>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// One row of a recursive link traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRow {
    pub node_id: NodeId,
    /// Immediate parent in this traversal step, `None` for a root row
    pub parent_id: Option<NodeId>,
    pub link_id: LinkId,
    /// True if the link is a mirror reference rather than primary containment
    pub is_bound: bool,
    /// 0 at the root, +1 per hop
    pub depth: u32,
    pub path: LinkPath,
}

impl GraphRow {
    /// Row for a traversal root reached through `link_id`
    pub fn root(node_id: NodeId, link_id: LinkId, is_bound: bool) -> Self {
        Self {
            node_id,
            parent_id: None,
            link_id,
            is_bound,
            depth: 0,
            path: LinkPath::root(link_id),
        }
    }

    /// Root row for a node that has children but no parent link of its own
    ///
    /// The node is reached through the pseudo-link `-node_id`, which never
    /// collides with a stored link id (those are positive).
    pub fn unlinked(node_id: NodeId) -> Self {
        Self::root(node_id, -node_id, false)
    }

    /// Row one hop below `self`, reached through `link_id`
    pub fn step(&self, node_id: NodeId, link_id: LinkId, is_bound: bool) -> Self {
        Self {
            node_id,
            parent_id: Some(self.node_id),
            link_id,
            is_bound,
            depth: self.depth + 1,
            path: self.path.push(link_id),
        }
    }

    /// A row whose parent path is empty is a root
    pub fn is_root(&self) -> bool {
        self.path.parent().is_empty()
    }
}
