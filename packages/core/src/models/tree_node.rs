//! Tree Node Model
//!
//! A row (or domain entity) decorated with its children once embedded in a
//! materialized hierarchy.

use super::graph_row::{GraphRow, NodeId};
use serde::{Deserialize, Serialize};

/// Anything that can be placed into a hierarchy tree
pub trait HierarchyItem {
    fn node_id(&self) -> NodeId;
    fn parent_id(&self) -> Option<NodeId>;
    fn is_bound(&self) -> bool;
}

impl HierarchyItem for GraphRow {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    fn is_bound(&self) -> bool {
        self.is_bound
    }
}

/// Which occurrences of a node a search accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundFilter {
    /// Only mirrored occurrences
    BoundOnly,
    /// Only primary (owned) occurrences
    UnboundOnly,
    #[default]
    Any,
}

impl BoundFilter {
    pub fn accepts(&self, is_bound: bool) -> bool {
        match self {
            BoundFilter::BoundOnly => is_bound,
            BoundFilter::UnboundOnly => !is_bound,
            BoundFilter::Any => true,
        }
    }
}

/// A node embedded in a materialized tree
///
/// `is_bound` starts as the item's own flag and may later be forced to true
/// by bound propagation. The item itself is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode<T = GraphRow> {
    pub item: T,
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub is_bound: bool,
    pub children: Vec<TreeNode<T>>,
}

impl<T: HierarchyItem> TreeNode<T> {
    /// Leaf node wrapping `item`
    pub fn new(item: T) -> Self {
        Self {
            node_id: item.node_id(),
            parent_id: item.parent_id(),
            is_bound: item.is_bound(),
            item,
            children: Vec::new(),
        }
    }
}

impl<T> TreeNode<T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_size).sum::<usize>()
    }

    /// Pre-order iterator over this subtree
    pub fn iter(&self) -> PreOrder<'_, T> {
        PreOrder { stack: vec![self] }
    }

    /// Node ids of this subtree in pre-order
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|node| node.node_id).collect()
    }
}

/// Depth-first pre-order traversal of a subtree
pub struct PreOrder<'a, T> {
    stack: Vec<&'a TreeNode<T>>,
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = &'a TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        let root = GraphRow::root(1, 10, false);
        let a = root.step(2, 11, false);
        let b = root.step(3, 12, true);
        let a1 = a.step(4, 13, false);

        let mut a_node = TreeNode::new(a);
        a_node.children.push(TreeNode::new(a1));
        let mut root_node = TreeNode::new(root);
        root_node.children.push(a_node);
        root_node.children.push(TreeNode::new(b));
        root_node
    }

    #[test]
    fn test_new_copies_item_fields() {
        let node = TreeNode::new(GraphRow::root(5, 50, true).step(6, 51, false));
        assert_eq!(node.node_id, 6);
        assert_eq!(node.parent_id, Some(5));
        assert!(!node.is_bound);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_pre_order_and_subtree_size() {
        let tree = sample();
        assert_eq!(tree.subtree_size(), 4);
        assert_eq!(tree.children[0].subtree_size(), 2);
        assert_eq!(tree.ids(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_bound_filter() {
        assert!(BoundFilter::BoundOnly.accepts(true));
        assert!(!BoundFilter::BoundOnly.accepts(false));
        assert!(BoundFilter::UnboundOnly.accepts(false));
        assert!(!BoundFilter::UnboundOnly.accepts(true));
        assert!(BoundFilter::Any.accepts(true));
        assert!(BoundFilter::Any.accepts(false));
    }
}
