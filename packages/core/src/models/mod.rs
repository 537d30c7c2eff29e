//! Data Models
//!
//! This module contains the data structures shared by the hierarchy core:
//!
//! - `GraphRow` - One row of a recursive link traversal (node, parent, link, path)
//! - `TreeNode` - A row or domain entity embedded in a materialized tree
//! - `Link` - A persisted edge between two folders or two tasks
//!
//! Rows are produced fresh per request and trees are discarded after use.

mod graph_row;
mod link;
mod tree_node;

pub use graph_row::{
    GraphRow, LinkId, LinkPath, NodeId, RelationKind, SpaceId, PATH_DELIMITER,
};
pub use link::{Link, NewLink};
pub use tree_node::{BoundFilter, HierarchyItem, PreOrder, TreeNode};
