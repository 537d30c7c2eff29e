//! Tree reconstruction from flat rows
//!
//! Rows are grouped by a derived parent key: a row is attached under the row
//! whose own path equals that key. Construction is two passes over the input
//! (index by path, then attach), so it stays linear in the number of rows.

use crate::config::DuplicatePathPolicy;
use crate::models::{GraphRow, HierarchyItem, LinkPath, TreeNode};
use crate::services::error::HierarchyError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Build a forest from `rows`
///
/// Every kept row appears exactly once, as a child of the row whose path
/// matches its derived parent key. Rows whose parent key matches nothing
/// become top-level nodes. Sibling order follows input order.
///
/// # Arguments
///
/// * `rows` - Rows in traversal order
/// * `path_of` - Key identifying a row's own position
/// * `parent_path_of` - Key of the row's parent position
/// * `duplicates` - What to do when two rows share a path
///
/// # Errors
///
/// `HierarchyError::MalformedInput` when duplicates are rejected, or when
/// parent keys form a loop so that some rows can never be placed.
pub fn build_tree<T, K, P, F>(
    rows: Vec<T>,
    path_of: P,
    parent_path_of: F,
    duplicates: DuplicatePathPolicy,
) -> Result<Vec<TreeNode<T>>, HierarchyError>
where
    T: HierarchyItem,
    K: Eq + Hash + Debug,
    P: Fn(&T) -> K,
    F: Fn(&T) -> K,
{
    // Pass 1: index rows by their own path
    let mut index: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<bool> = Vec::with_capacity(rows.len());

    for (position, row) in rows.iter().enumerate() {
        let key = path_of(row);
        if index.contains_key(&key) {
            match duplicates {
                DuplicatePathPolicy::Reject => {
                    return Err(HierarchyError::malformed_input(format!(
                        "duplicate path {:?} (node {})",
                        key,
                        row.node_id()
                    )));
                }
                DuplicatePathPolicy::KeepFirst => {
                    tracing::warn!(
                        "Dropping duplicate row for node {} at path {:?}",
                        row.node_id(),
                        key
                    );
                    kept.push(false);
                    continue;
                }
            }
        }
        index.insert(key, position);
        kept.push(true);
    }

    // Pass 2: attach each row under the node found at its parent key
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut top_level: Vec<usize> = Vec::new();

    for (position, row) in rows.iter().enumerate() {
        if !kept[position] {
            continue;
        }
        match index.get(&parent_path_of(row)) {
            Some(&parent) if parent != position => children_of[parent].push(position),
            _ => top_level.push(position),
        }
    }

    let expected = kept.iter().filter(|k| **k).count();
    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    let mut forest = Vec::with_capacity(top_level.len());
    let mut placed = 0;

    for position in top_level {
        if let Some(node) = assemble(position, &mut slots, &children_of, &mut placed) {
            forest.push(node);
        }
    }

    if placed != expected {
        return Err(HierarchyError::malformed_input(format!(
            "{} rows have parent paths that loop back on themselves",
            expected - placed
        )));
    }

    Ok(forest)
}

/// Build a forest from traversal rows keyed by their link paths
pub fn build_row_tree(
    rows: Vec<GraphRow>,
    duplicates: DuplicatePathPolicy,
) -> Result<Vec<TreeNode<GraphRow>>, HierarchyError> {
    build_tree(
        rows,
        |row: &GraphRow| row.path.clone(),
        |row: &GraphRow| -> LinkPath { row.path.parent() },
        duplicates,
    )
}

fn assemble<T: HierarchyItem>(
    position: usize,
    slots: &mut [Option<T>],
    children_of: &[Vec<usize>],
    placed: &mut usize,
) -> Option<TreeNode<T>> {
    let item = slots[position].take()?;
    *placed += 1;

    let mut node = TreeNode::new(item);
    node.children.reserve(children_of[position].len());
    for &child in &children_of[position] {
        if let Some(child_node) = assemble(child, slots, children_of, placed) {
            node.children.push(child_node);
        }
    }
    Some(node)
}
