//! Row Source Seam
//!
//! The hierarchy core never generates queries. It receives rows from a row
//! source that performs the recursive expansion of a link table, and hands
//! link writes to a link store only after a negative loop verdict.

use crate::models::{GraphRow, Link, NewLink, NodeId, RelationKind, SpaceId};
use async_trait::async_trait;

/// Recursive expansion over a persisted link table
///
/// Implementations must track the path of link ids per row and end a branch
/// when a link repeats along it, so that loops in stored data terminate.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Rows reachable downwards from `roots`; each root yields a depth-0 row
    /// through its primary link, or [`GraphRow::unlinked`] when it only has
    /// children. Roots without any link yield no rows.
    async fn descendant_rows(
        &self,
        kind: RelationKind,
        roots: &[NodeId],
    ) -> anyhow::Result<Vec<GraphRow>>;

    /// Parent edges reachable upwards from `node_id`, one row per link
    /// (`node_id` is the child end, `parent_id` the parent end)
    async fn ancestor_rows(&self, kind: RelationKind, node_id: NodeId)
        -> anyhow::Result<Vec<GraphRow>>;

    /// Rows of every hierarchy rooted directly in `space_id`
    async fn space_rows(&self, kind: RelationKind, space_id: SpaceId)
        -> anyhow::Result<Vec<GraphRow>>;
}

/// Row source that also persists links
#[async_trait]
pub trait LinkStore: RowSource {
    async fn insert_link(&self, kind: RelationKind, link: NewLink) -> anyhow::Result<Link>;
}
