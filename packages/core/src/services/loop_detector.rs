//! Loop Detection for Hierarchy Links
//!
//! Decides whether linking `parent -> child` would close a loop. Two checks
//! exist because they answer different questions:
//!
//! - **Containment** (plain hierarchies such as tasks): is the parent already
//!   somewhere in the descendant closure of the child?
//! - **Bound-aware** (folders): the same question asked against the
//!   materialized tree of a space, where bound mirrors add extra paths. A bound
//!   copy of a node appearing above or below its own original also counts.
//!
//! Both checks are pure. They never fetch rows and never decide what a caller
//! does with a positive verdict.

use crate::config::{DuplicatePathPolicy, HierarchyConfig};
use crate::models::{BoundFilter, GraphRow, NodeId, TreeNode};
use crate::services::error::{CycleReason, HierarchyError};
use crate::tree::{
    build_row_tree, contains_descendant, find_in_forest, find_preferring_unbound, propagate_forest,
};

/// Outcome of a loop check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopVerdict {
    /// Rule that rejected the link, `None` when the link is safe
    pub reason: Option<CycleReason>,
}

impl LoopVerdict {
    pub fn safe() -> Self {
        Self { reason: None }
    }

    pub fn cycle(reason: CycleReason) -> Self {
        Self {
            reason: Some(reason),
        }
    }

    pub fn is_cycle(&self) -> bool {
        self.reason.is_some()
    }
}

/// Loop checks over caller-supplied rows or trees
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopDetector {
    duplicates: DuplicatePathPolicy,
}

impl LoopDetector {
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            duplicates: config.duplicate_paths,
        }
    }

    /// Containment check over the descendant closure of `child`
    ///
    /// `descendant_rows` must be the rows reachable by expanding `child`
    /// downwards, with `child` itself as the root row. The link is a loop iff
    /// `parent` already occurs in that closure, either as a parent of some row
    /// or as a (possibly leaf) row of its own. A child without any rows has no
    /// descendants, so the link is safe.
    ///
    /// # Errors
    ///
    /// `HierarchyError::NotFound` if rows are given but none of them is `child`.
    pub fn containment_verdict(
        &self,
        parent: NodeId,
        child: NodeId,
        descendant_rows: &[GraphRow],
    ) -> Result<LoopVerdict, HierarchyError> {
        if parent == child {
            return Ok(LoopVerdict::cycle(CycleReason::SelfLink));
        }

        if descendant_rows.is_empty() {
            return Ok(LoopVerdict::safe());
        }

        if !descendant_rows.iter().any(|row| row.node_id == child) {
            return Err(HierarchyError::not_found(child));
        }

        let reached = descendant_rows
            .iter()
            .any(|row| row.parent_id == Some(parent) || row.node_id == parent);

        if reached {
            Ok(LoopVerdict::cycle(CycleReason::DescendantOfChild))
        } else {
            Ok(LoopVerdict::safe())
        }
    }

    /// Bound-aware check over the rows of a whole space (or of several roots)
    ///
    /// Builds the forest, propagates bound status, then runs
    /// [`LoopDetector::bound_verdict_in_forest`].
    pub fn bound_verdict(
        &self,
        parent: NodeId,
        child: NodeId,
        rows: Vec<GraphRow>,
    ) -> Result<LoopVerdict, HierarchyError> {
        if parent == child {
            return Ok(LoopVerdict::cycle(CycleReason::SelfLink));
        }

        let mut forest = build_row_tree(rows, self.duplicates)?;
        propagate_forest(&mut forest);
        self.bound_verdict_in_forest(parent, child, &forest)
    }

    /// Bound-aware check over an already materialized, bound-propagated forest
    ///
    /// Rejects the link when any of these hold:
    ///
    /// 1. `parent == child`
    /// 2. `parent` occurs beneath the located `child` (primary occurrence
    ///    preferred, bound occurrence as fallback)
    /// 3. the first bound copy of `child` already hangs directly under `parent`
    /// 4. the first bound copy of `parent` has `child` beneath it, or the first
    ///    bound copy of `child` has `parent` beneath it
    ///
    /// # Errors
    ///
    /// `HierarchyError::NotFound` if `child` does not occur in the forest.
    pub fn bound_verdict_in_forest(
        &self,
        parent: NodeId,
        child: NodeId,
        forest: &[TreeNode<GraphRow>],
    ) -> Result<LoopVerdict, HierarchyError> {
        if parent == child {
            return Ok(LoopVerdict::cycle(CycleReason::SelfLink));
        }

        let child_node = find_preferring_unbound(forest, child)
            .ok_or_else(|| HierarchyError::not_found(child))?;

        if parent_beneath(child_node, parent) {
            tracing::debug!(
                "Parent {} found beneath child {} (link {})",
                parent,
                child,
                child_node.item.link_id
            );
            return Ok(LoopVerdict::cycle(CycleReason::DescendantOfChild));
        }

        let parent_bound = find_in_forest(forest, parent, BoundFilter::BoundOnly);
        let child_bound = find_in_forest(forest, child, BoundFilter::BoundOnly);

        if let Some(copy) = child_bound {
            if copy.parent_id == Some(parent) {
                return Ok(LoopVerdict::cycle(CycleReason::ExistingBoundLink));
            }
        }

        let parent_copy_holds_child = parent_bound
            .map(|copy| contains_descendant(copy, child, BoundFilter::Any))
            .unwrap_or(false);
        let child_copy_holds_parent = child_bound
            .map(|copy| contains_descendant(copy, parent, BoundFilter::Any))
            .unwrap_or(false);

        if parent_copy_holds_child || child_copy_holds_parent {
            return Ok(LoopVerdict::cycle(CycleReason::BoundMirror));
        }

        Ok(LoopVerdict::safe())
    }
}

/// `parent` beneath `node`: primary occurrence first, bound occurrence as fallback
fn parent_beneath(node: &TreeNode<GraphRow>, parent: NodeId) -> bool {
    contains_descendant(node, parent, BoundFilter::UnboundOnly)
        || contains_descendant(node, parent, BoundFilter::BoundOnly)
}

/// Would linking `parent -> child` create a loop, judged over `rows`
///
/// `rows` is the full reachable set for the relevant root(s). Uses the
/// bound-aware check with default configuration.
pub fn would_create_cycle(
    parent: NodeId,
    child: NodeId,
    rows: &[GraphRow],
) -> Result<bool, HierarchyError> {
    LoopDetector::default()
        .bound_verdict(parent, child, rows.to_vec())
        .map(|verdict| verdict.is_cycle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkPath;

    fn row(node_id: NodeId, parent_id: Option<NodeId>, path: &str, is_bound: bool) -> GraphRow {
        let path: LinkPath = path.parse().unwrap();
        GraphRow {
            node_id,
            parent_id,
            link_id: path.last().unwrap_or_default(),
            is_bound,
            depth: path.len().saturating_sub(1) as u32,
            path,
        }
    }

    fn three_nodes() -> Vec<GraphRow> {
        vec![
            row(1, None, "1", false),
            row(2, Some(1), "1,2", false),
            row(3, Some(1), "1,3", false),
        ]
    }

    /// Space with roots 1 and 4. 1 -> 2, 4 -> 5 -> 6, and 5 bound under 2.
    fn bound_space() -> Vec<GraphRow> {
        vec![
            row(1, None, "1", false),
            row(4, None, "4", false),
            row(2, Some(1), "1,2", false),
            row(5, Some(4), "4,5", false),
            row(5, Some(2), "1,2,7", true),
            row(6, Some(5), "4,5,6", false),
            row(6, Some(5), "1,2,7,6", false),
        ]
    }

    #[test]
    fn test_self_link_is_cycle() {
        for id in [1, 2, 3, 99] {
            assert!(would_create_cycle(id, id, &three_nodes()).unwrap());
        }
    }

    #[test]
    fn test_scenario_siblings_are_safe() {
        assert!(!would_create_cycle(2, 3, &three_nodes()).unwrap());
        assert!(!would_create_cycle(3, 2, &three_nodes()).unwrap());
    }

    #[test]
    fn test_scenario_ancestor_under_descendant_is_cycle() {
        assert!(would_create_cycle(3, 1, &three_nodes()).unwrap());
        assert!(would_create_cycle(2, 1, &three_nodes()).unwrap());
    }

    #[test]
    fn test_missing_child_is_not_found() {
        let result = would_create_cycle(1, 42, &three_nodes());
        assert!(matches!(result, Err(HierarchyError::NotFound { id: 42 })));

        let empty = would_create_cycle(1, 2, &[]);
        assert!(matches!(empty, Err(HierarchyError::NotFound { id: 2 })));
    }

    #[test]
    fn test_bound_descendant_is_cycle() {
        // 6 reads as bound under 2 through the mirror of 5
        let detector = LoopDetector::default();
        let verdict = detector.bound_verdict(6, 2, bound_space()).unwrap();
        assert_eq!(verdict.reason, Some(CycleReason::DescendantOfChild));
    }

    #[test]
    fn test_existing_bound_link_is_cycle() {
        // 5 already hangs under 2 as a mirror
        let detector = LoopDetector::default();
        let verdict = detector.bound_verdict(2, 5, bound_space()).unwrap();
        assert_eq!(verdict.reason, Some(CycleReason::ExistingBoundLink));
    }

    #[test]
    fn test_bound_copy_of_parent_holding_child_is_cycle() {
        // 1 -> 3 -> 8 -> 9, and 3 mirrored under root 20
        let rows = vec![
            row(1, None, "1", false),
            row(20, None, "20", false),
            row(3, Some(1), "1,3", false),
            row(3, Some(20), "20,30", true),
            row(8, Some(3), "1,3,8", false),
            row(8, Some(3), "20,30,8", false),
            row(9, Some(8), "1,3,8,9", false),
            row(9, Some(8), "20,30,8,9", false),
        ];
        let detector = LoopDetector::default();
        let verdict = detector.bound_verdict(3, 9, rows).unwrap();
        assert_eq!(verdict.reason, Some(CycleReason::BoundMirror));
    }

    #[test]
    fn test_bound_copy_of_child_holding_parent_is_cycle() {
        // Forest where the mirror of 5 under 20 holds 9 but the owned 5 does not
        let r1 = GraphRow::root(1, 1, false);
        let r5 = r1.step(5, 2, false);
        let r20 = GraphRow::root(20, 3, false);
        let r5_mirror = r20.step(5, 4, true);
        let r9 = r5_mirror.step(9, 5, false);

        let mut n1 = TreeNode::new(r1);
        n1.children.push(TreeNode::new(r5));
        let mut n5_mirror = TreeNode::new(r5_mirror);
        n5_mirror.children.push(TreeNode::new(r9));
        let mut n20 = TreeNode::new(r20);
        n20.children.push(n5_mirror);

        let mut forest = vec![n1, n20];
        propagate_forest(&mut forest);

        let verdict = LoopDetector::default()
            .bound_verdict_in_forest(9, 5, &forest)
            .unwrap();
        assert_eq!(verdict.reason, Some(CycleReason::BoundMirror));
    }

    #[test]
    fn test_child_only_present_as_mirror() {
        // 5 exists only as a bound copy under 2; linking it under 3 is safe
        let rows = vec![
            row(1, None, "1", false),
            row(2, Some(1), "1,2", false),
            row(3, Some(1), "1,3", false),
            row(5, Some(2), "1,2,5", true),
        ];
        let detector = LoopDetector::default();
        assert!(!detector.bound_verdict(3, 5, rows.clone()).unwrap().is_cycle());
        assert_eq!(
            detector.bound_verdict(2, 5, rows).unwrap().reason,
            Some(CycleReason::ExistingBoundLink)
        );
    }

    #[test]
    fn test_unrelated_subtrees_are_safe() {
        let rows = vec![
            row(1, None, "1", false),
            row(2, Some(1), "1,2", false),
            row(10, None, "10", false),
            row(11, Some(10), "10,11", false),
        ];
        assert!(!would_create_cycle(2, 11, &rows).unwrap());
        assert!(!would_create_cycle(11, 2, &rows).unwrap());
        assert!(!would_create_cycle(1, 10, &rows).unwrap());
    }

    #[test]
    fn test_containment_checks_parent_ids_and_leaves() {
        let detector = LoopDetector::default();
        // Descendant closure of 1: 1 -> 2 -> 4 (leaf)
        let closure = vec![
            row(1, None, "1", false),
            row(2, Some(1), "1,2", false),
            row(4, Some(2), "1,2,4", false),
        ];
        assert!(detector.containment_verdict(2, 1, &closure).unwrap().is_cycle());
        assert!(detector.containment_verdict(4, 1, &closure).unwrap().is_cycle());
        assert!(!detector.containment_verdict(9, 1, &closure).unwrap().is_cycle());
        assert_eq!(
            detector.containment_verdict(1, 1, &closure).unwrap().reason,
            Some(CycleReason::SelfLink)
        );
        assert!(matches!(
            detector.containment_verdict(2, 7, &closure),
            Err(HierarchyError::NotFound { id: 7 })
        ));
    }

    #[test]
    fn test_containment_over_empty_closure_is_safe() {
        let verdict = LoopDetector::default()
            .containment_verdict(1, 2, &[])
            .unwrap();
        assert_eq!(verdict, LoopVerdict::safe());
    }

    #[test]
    fn test_duplicate_paths_follow_policy() {
        let mut rows = three_nodes();
        rows.push(row(3, Some(1), "1,3", false));

        assert!(matches!(
            would_create_cycle(2, 3, &rows),
            Err(HierarchyError::MalformedInput(_))
        ));

        let lenient = LoopDetector::new(
            &HierarchyConfig::default().with_duplicate_paths(DuplicatePathPolicy::KeepFirst),
        );
        assert!(!lenient.bound_verdict(2, 3, rows).unwrap().is_cycle());
    }
}
