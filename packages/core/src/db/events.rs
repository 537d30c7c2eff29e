//! Link Events
//!
//! Events emitted by a link store after a link write commits. Subscribers
//! (notification plumbing, caches) receive them through a tokio broadcast
//! channel without coupling to the store implementation.

use crate::models::{Link, LinkId, RelationKind};
use serde::{Deserialize, Serialize};

/// Change to a folder or task link table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkEvent {
    /// A link was committed
    #[serde(rename = "link:created")]
    LinkCreated { kind: RelationKind, link: Link },

    /// A link was removed
    #[serde(rename = "link:removed", rename_all = "camelCase")]
    LinkRemoved { kind: RelationKind, link_id: LinkId },
}

impl LinkEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            LinkEvent::LinkCreated { .. } => "link:created",
            LinkEvent::LinkRemoved { .. } => "link:removed",
        }
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            LinkEvent::LinkCreated { kind, .. } | LinkEvent::LinkRemoved { kind, .. } => *kind,
        }
    }
}
