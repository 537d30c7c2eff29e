//! Depth-first search over materialized trees

use crate::models::{BoundFilter, NodeId, TreeNode};

/// First node in pre-order with `id` whose bound status passes `filter`
pub fn find_by_id<T>(node: &TreeNode<T>, id: NodeId, filter: BoundFilter) -> Option<&TreeNode<T>> {
    if node.node_id == id && filter.accepts(node.is_bound) {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_by_id(child, id, filter))
}

/// [`find_by_id`] across every top-level node of a forest, in order
pub fn find_in_forest<T>(
    forest: &[TreeNode<T>],
    id: NodeId,
    filter: BoundFilter,
) -> Option<&TreeNode<T>> {
    forest.iter().find_map(|root| find_by_id(root, id, filter))
}

/// Primary occurrence of `id` if any, otherwise a bound one
pub fn find_preferring_unbound<T>(forest: &[TreeNode<T>], id: NodeId) -> Option<&TreeNode<T>> {
    find_in_forest(forest, id, BoundFilter::UnboundOnly)
        .or_else(|| find_in_forest(forest, id, BoundFilter::BoundOnly))
}

/// True if `id` occurs strictly below `node`
pub fn contains_descendant<T>(node: &TreeNode<T>, id: NodeId, filter: BoundFilter) -> bool {
    node.children
        .iter()
        .any(|child| find_by_id(child, id, filter).is_some())
}
