//! Link records
//!
//! A link places a child node under a parent. Plain links are primary
//! containment; bound links mirror an existing node into another place.

use super::graph_row::{LinkId, NodeId, SpaceId};
use serde::{Deserialize, Serialize};

/// A persisted edge of a folder or task hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    /// `None` places the child directly in its space (top level)
    pub parent_id: Option<NodeId>,
    pub child_id: NodeId,
    pub is_bound: bool,
    /// Set only on top-level links
    pub space_id: Option<SpaceId>,
}

/// Parameters for creating a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLink {
    pub parent_id: Option<NodeId>,
    pub child_id: NodeId,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
}

impl NewLink {
    /// Primary containment of `child_id` under `parent_id`
    pub fn child_of(parent_id: NodeId, child_id: NodeId) -> Self {
        Self {
            parent_id: Some(parent_id),
            child_id,
            is_bound: false,
            space_id: None,
        }
    }

    /// Mirror of `child_id` shown under `parent_id`
    pub fn bound_under(parent_id: NodeId, child_id: NodeId) -> Self {
        Self {
            parent_id: Some(parent_id),
            child_id,
            is_bound: true,
            space_id: None,
        }
    }

    /// Top-level placement of `child_id` in `space_id`
    pub fn top_level(space_id: SpaceId, child_id: NodeId) -> Self {
        Self {
            parent_id: None,
            child_id,
            is_bound: false,
            space_id: Some(space_id),
        }
    }
}
