//! Ancestor Queries
//!
//! Answers "does any ancestor of X satisfy P?" for ownership and permission
//! propagation. The walk goes upward over parent edges taken from rows of an
//! upward traversal (each row is an edge `node_id -> parent_id`).
//!
//! Upward chains are acyclic only because loop detection guards writes.
//! Seeded or inconsistent data can still contain loops, so the walk carries a
//! visited set and a depth bound.

use crate::config::HierarchyConfig;
use crate::models::{GraphRow, LinkId, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// A node visited while walking upward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestorStep {
    pub node_id: NodeId,
    /// 0 for the starting node, +1 per hop upward
    pub depth: usize,
    /// Link followed to reach this node, `None` for the starting node
    pub via_link: Option<LinkId>,
    /// True if the link followed was a bound mirror
    pub is_bound: bool,
}

/// Upward walk from a node, short-circuiting on the first qualifying ancestor
///
/// The starting node itself is visited first (depth 0).
#[derive(Debug, Clone, Copy)]
pub struct AncestorQuery {
    node_id: NodeId,
    max_depth: usize,
    include_bound: bool,
}

#[derive(Debug, Clone, Copy)]
struct ParentEdge {
    parent_id: NodeId,
    link_id: LinkId,
    is_bound: bool,
}

impl AncestorQuery {
    pub fn new(node_id: NodeId) -> Self {
        Self::from_config(node_id, &HierarchyConfig::default())
    }

    pub fn from_config(node_id: NodeId, config: &HierarchyConfig) -> Self {
        Self {
            node_id,
            max_depth: config.max_depth,
            include_bound: config.include_bound_ancestors,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether bound links are followed upward
    pub fn include_bound(mut self, include_bound: bool) -> Self {
        self.include_bound = include_bound;
        self
    }

    /// True if some visited node satisfies `predicate`
    pub fn run<P>(&self, rows: &[GraphRow], predicate: P) -> bool
    where
        P: FnMut(&AncestorStep) -> bool,
    {
        self.find(rows, predicate).is_some()
    }

    /// First visited node (breadth-first, nearest first) satisfying `predicate`
    pub fn find<P>(&self, rows: &[GraphRow], mut predicate: P) -> Option<AncestorStep>
    where
        P: FnMut(&AncestorStep) -> bool,
    {
        let parents = parent_edges(rows);

        let mut visited_nodes: HashSet<NodeId> = HashSet::new();
        let mut visited_links: HashSet<LinkId> = HashSet::new();
        let mut queue: VecDeque<AncestorStep> = VecDeque::new();

        queue.push_back(AncestorStep {
            node_id: self.node_id,
            depth: 0,
            via_link: None,
            is_bound: false,
        });

        while let Some(step) = queue.pop_front() {
            if !visited_nodes.insert(step.node_id) {
                continue;
            }

            if predicate(&step) {
                tracing::debug!(
                    "Qualifying ancestor {} of {} at depth {}",
                    step.node_id,
                    self.node_id,
                    step.depth
                );
                return Some(step);
            }

            let Some(edges) = parents.get(&step.node_id) else {
                continue;
            };

            if step.depth >= self.max_depth {
                tracing::warn!(
                    "Ancestor walk from {} stopped at depth limit {}",
                    self.node_id,
                    self.max_depth
                );
                continue;
            }

            for edge in edges {
                if edge.is_bound && !self.include_bound {
                    continue;
                }
                if !visited_links.insert(edge.link_id) || visited_nodes.contains(&edge.parent_id) {
                    continue;
                }
                queue.push_back(AncestorStep {
                    node_id: edge.parent_id,
                    depth: step.depth + 1,
                    via_link: Some(edge.link_id),
                    is_bound: edge.is_bound,
                });
            }
        }

        None
    }
}

/// Does any ancestor of `node_id` (or the node itself) satisfy `predicate`
pub fn has_qualifying_ancestor<P>(node_id: NodeId, rows: &[GraphRow], predicate: P) -> bool
where
    P: FnMut(&AncestorStep) -> bool,
{
    AncestorQuery::new(node_id).run(rows, predicate)
}

/// child -> parent edges, each link kept once, in row order
fn parent_edges(rows: &[GraphRow]) -> HashMap<NodeId, Vec<ParentEdge>> {
    let mut seen: HashSet<LinkId> = HashSet::new();
    let mut edges: HashMap<NodeId, Vec<ParentEdge>> = HashMap::new();

    for row in rows {
        let Some(parent_id) = row.parent_id else {
            continue;
        };
        if !seen.insert(row.link_id) {
            continue;
        }
        edges.entry(row.node_id).or_default().push(ParentEdge {
            parent_id,
            link_id: row.link_id,
            is_bound: row.is_bound,
        });
    }

    edges
}
