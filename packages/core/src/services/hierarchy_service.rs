//! Hierarchy Service
//!
//! Orchestrates the pure tree utilities and checks over an external row
//! source:
//!
//! - Read path: fetch rows, build the forest, propagate bound status
//! - Write path: loop check first, persist only on a negative verdict
//! - Ancestor queries for ownership and permission propagation
//!
//! # Check-then-write
//!
//! `link_checked` serializes verdict and write through a service-wide lock,
//! so every verdict is taken over rows that include all links previously
//! committed through the same service.

use crate::config::HierarchyConfig;
use crate::db::{LinkStore, RowSource};
use crate::models::{
    BoundFilter, GraphRow, Link, NewLink, NodeId, RelationKind, SpaceId, TreeNode,
};
use crate::services::ancestor_query::{AncestorQuery, AncestorStep};
use crate::services::error::{CycleReason, HierarchyError};
use crate::services::loop_detector::{LoopDetector, LoopVerdict};
use crate::tree::{build_row_tree, find_in_forest, propagate_forest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A prospective link between two nodes of one hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub kind: RelationKind,
    pub parent_id: NodeId,
    pub child_id: NodeId,
    #[serde(default)]
    pub is_bound: bool,
    /// Space whose forest the bound-aware check runs against (folders only)
    #[serde(default)]
    pub space_id: Option<SpaceId>,
}

impl LinkRequest {
    /// Folder link checked against the forest of `space_id`
    pub fn folder(space_id: SpaceId, parent_id: NodeId, child_id: NodeId) -> Self {
        Self {
            kind: RelationKind::Folder,
            parent_id,
            child_id,
            is_bound: false,
            space_id: Some(space_id),
        }
    }

    /// Plain task parent/child link
    pub fn task(parent_id: NodeId, child_id: NodeId) -> Self {
        Self {
            kind: RelationKind::Task,
            parent_id,
            child_id,
            is_bound: false,
            space_id: None,
        }
    }

    pub fn bound(mut self) -> Self {
        self.is_bound = true;
        self
    }
}

/// Hierarchy operations over a row source
pub struct HierarchyService<S> {
    source: Arc<S>,
    config: HierarchyConfig,
    detector: LoopDetector,
    write_lock: Mutex<()>,
}

impl<S: RowSource> HierarchyService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_config(source, HierarchyConfig::default())
    }

    pub fn with_config(source: Arc<S>, config: HierarchyConfig) -> Self {
        Self {
            source,
            detector: LoopDetector::new(&config),
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Materialized, bound-propagated forest of one space
    ///
    /// A space without rows yields an empty forest.
    pub async fn space_tree(
        &self,
        kind: RelationKind,
        space_id: SpaceId,
    ) -> Result<Vec<TreeNode<GraphRow>>, HierarchyError> {
        let rows = self
            .source
            .space_rows(kind, space_id)
            .await
            .map_err(|e| HierarchyError::source_failed(e, "Failed to fetch space rows"))?;
        self.materialize(rows)
    }

    /// Materialized, bound-propagated subtree below `root_id`
    pub async fn subtree(
        &self,
        kind: RelationKind,
        root_id: NodeId,
    ) -> Result<TreeNode<GraphRow>, HierarchyError> {
        let rows = self.descendants(kind, &[root_id]).await?;
        self.materialize(rows)?
            .into_iter()
            .find(|root| root.node_id == root_id)
            .ok_or_else(|| HierarchyError::not_found(root_id))
    }

    /// First occurrence of `node_id` in a space that passes `filter`
    pub async fn find_in_space(
        &self,
        kind: RelationKind,
        space_id: SpaceId,
        node_id: NodeId,
        filter: BoundFilter,
    ) -> Result<Option<TreeNode<GraphRow>>, HierarchyError> {
        let forest = self.space_tree(kind, space_id).await?;
        Ok(find_in_forest(&forest, node_id, filter).cloned())
    }

    /// Loop verdict for a prospective link
    ///
    /// The containment check runs for every hierarchy. Folders additionally
    /// run the bound-aware check, over the rows of `space_id` (joined with the
    /// rows below the child when it lives in another space) when a space is
    /// given, and otherwise over the rows below both endpoints. A child without
    /// any links has no descendants and no mirrors, so it is safe to link
    /// anywhere.
    pub async fn check_link(&self, request: &LinkRequest) -> Result<LoopVerdict, HierarchyError> {
        let LinkRequest {
            kind,
            parent_id,
            child_id,
            ..
        } = *request;

        if parent_id == child_id {
            let verdict = LoopVerdict::cycle(CycleReason::SelfLink);
            self.log_verdict(request, &verdict);
            return Ok(verdict);
        }

        let closure = self.descendants(kind, &[child_id]).await?;
        let verdict = self
            .detector
            .containment_verdict(parent_id, child_id, &closure)?;
        if verdict.is_cycle() || closure.is_empty() || !kind.uses_bound_links() {
            self.log_verdict(request, &verdict);
            return Ok(verdict);
        }

        let rows = match request.space_id {
            Some(space_id) => {
                let space_rows = self
                    .source
                    .space_rows(kind, space_id)
                    .await
                    .map_err(|e| HierarchyError::source_failed(e, "Failed to fetch space rows"))?;
                join_rows(space_rows, child_id, closure)
            }
            None => self.descendants(kind, &[child_id, parent_id]).await?,
        };

        let verdict = self.detector.bound_verdict(parent_id, child_id, rows)?;
        self.log_verdict(request, &verdict);
        Ok(verdict)
    }

    /// True if the link would create a loop
    pub async fn would_create_cycle(&self, request: &LinkRequest) -> Result<bool, HierarchyError> {
        Ok(self.check_link(request).await?.is_cycle())
    }

    /// Does `node_id` or any of its ancestors satisfy `predicate`
    pub async fn has_qualifying_ancestor<P>(
        &self,
        kind: RelationKind,
        node_id: NodeId,
        predicate: P,
    ) -> Result<bool, HierarchyError>
    where
        P: FnMut(&AncestorStep) -> bool + Send,
    {
        let rows = self
            .source
            .ancestor_rows(kind, node_id)
            .await
            .map_err(|e| HierarchyError::source_failed(e, "Failed to fetch ancestor rows"))?;
        Ok(AncestorQuery::from_config(node_id, &self.config).run(&rows, predicate))
    }

    async fn descendants(
        &self,
        kind: RelationKind,
        roots: &[NodeId],
    ) -> Result<Vec<GraphRow>, HierarchyError> {
        self.source
            .descendant_rows(kind, roots)
            .await
            .map_err(|e| HierarchyError::source_failed(e, "Failed to fetch descendant rows"))
    }

    fn materialize(&self, rows: Vec<GraphRow>) -> Result<Vec<TreeNode<GraphRow>>, HierarchyError> {
        let mut forest = build_row_tree(rows, self.config.duplicate_paths)?;
        propagate_forest(&mut forest);
        Ok(forest)
    }

    fn log_verdict(&self, request: &LinkRequest, verdict: &LoopVerdict) {
        match verdict.reason {
            Some(reason) => tracing::debug!(
                "Rejecting {} link {} -> {}: {}",
                request.kind,
                request.parent_id,
                request.child_id,
                reason
            ),
            None => tracing::debug!(
                "{} link {} -> {} is safe",
                request.kind,
                request.parent_id,
                request.child_id
            ),
        }
    }
}

/// Space rows, plus the rows below `child_id` when the child lives outside
/// the space (a mirror of a folder from another space)
fn join_rows(
    space_rows: Vec<GraphRow>,
    child_id: NodeId,
    child_rows: Vec<GraphRow>,
) -> Vec<GraphRow> {
    if space_rows.iter().any(|row| row.node_id == child_id) {
        return space_rows;
    }
    let mut rows = space_rows;
    rows.extend(child_rows);
    rows
}

impl<S: LinkStore> HierarchyService<S> {
    /// Persist a link only if it does not create a loop
    ///
    /// # Errors
    ///
    /// - `HierarchyError::CycleDetected` when the loop check rejects the link
    /// - `HierarchyError::NotFound` when the child has no rows to check against
    /// - `HierarchyError::SourceFailed` when fetching rows or writing fails
    pub async fn link_checked(&self, request: LinkRequest) -> Result<Link, HierarchyError> {
        let _guard = self.write_lock.lock().await;

        let verdict = self.check_link(&request).await?;
        if let Some(reason) = verdict.reason {
            return Err(HierarchyError::cycle_detected(
                request.parent_id,
                request.child_id,
                reason,
            ));
        }

        let new_link = NewLink {
            parent_id: Some(request.parent_id),
            child_id: request.child_id,
            is_bound: request.is_bound,
            space_id: None,
        };
        self.source
            .insert_link(request.kind, new_link)
            .await
            .map_err(|e| HierarchyError::source_failed(e, "Failed to persist link"))
    }
}
