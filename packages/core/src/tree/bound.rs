//! Bound status propagation
//!
//! A bound link mirrors an entire subtree, so every node reached through a
//! bound ancestor reads as bound no matter how it is linked in its own home.

use crate::models::TreeNode;

/// Force bound status down every bound subtree of `node`
pub fn propagate_bound<T>(mut node: TreeNode<T>) -> TreeNode<T> {
    propagate_bound_in_place(&mut node);
    node
}

/// In-place variant of [`propagate_bound`]
pub fn propagate_bound_in_place<T>(node: &mut TreeNode<T>) {
    if node.is_bound {
        mark_subtree_bound(node);
    } else {
        for child in &mut node.children {
            propagate_bound_in_place(child);
        }
    }
}

/// Apply [`propagate_bound_in_place`] to every top-level node
pub fn propagate_forest<T>(forest: &mut [TreeNode<T>]) {
    for root in forest.iter_mut() {
        propagate_bound_in_place(root);
    }
}

fn mark_subtree_bound<T>(node: &mut TreeNode<T>) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        current.is_bound = true;
        stack.extend(current.children.iter_mut());
    }
}
