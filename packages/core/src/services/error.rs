//! Service Layer Error Types
//!
//! This module defines the error surface of the hierarchy core. A detected
//! cycle is a normal verdict for the pure checks; it only becomes an error
//! when a guarded link write is refused.

use crate::models::NodeId;
use std::fmt;
use thiserror::Error;

/// Which loop rule rejected a prospective link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReason {
    /// Parent and child are the same node
    SelfLink,
    /// The parent is already a descendant of the child
    DescendantOfChild,
    /// A bound copy of the child already sits directly under the parent
    ExistingBoundLink,
    /// A bound copy of the parent contains the child, or vice versa
    BoundMirror,
}

impl fmt::Display for CycleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CycleReason::SelfLink => "node cannot be linked under itself",
            CycleReason::DescendantOfChild => "parent is a descendant of the child",
            CycleReason::ExistingBoundLink => "child is already bound under the parent",
            CycleReason::BoundMirror => "a bound mirror already connects parent and child",
        };
        f.write_str(text)
    }
}

/// Hierarchy operation errors
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// A node expected in the supplied rows or tree is missing
    #[error("Node not found: {id}")]
    NotFound { id: NodeId },

    /// Rows that cannot be turned into a tree
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A guarded link write was refused
    #[error("Linking {child_id} under {parent_id} would create a loop: {reason}")]
    CycleDetected {
        parent_id: NodeId,
        child_id: NodeId,
        reason: CycleReason,
    },

    /// The row source failed to produce rows
    #[error("Row source failed: {0}")]
    SourceFailed(String),
}

impl HierarchyError {
    /// Create a not found error
    pub fn not_found(id: NodeId) -> Self {
        Self::NotFound { id }
    }

    /// Create a malformed input error
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a cycle detected error
    pub fn cycle_detected(parent_id: NodeId, child_id: NodeId, reason: CycleReason) -> Self {
        Self::CycleDetected {
            parent_id,
            child_id,
            reason,
        }
    }

    /// Create a source failure error with context
    pub fn source_failed(e: anyhow::Error, context: &str) -> Self {
        Self::SourceFailed(format!("{}: {}", context, e))
    }

    /// True for the cycle rejection, which callers surface as a user-facing refusal
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}
