//! Hierarchy Services
//!
//! This module contains the checks and orchestration built on the tree
//! utilities:
//!
//! - `LoopDetector` - Containment and bound-aware loop checks for new links
//! - `AncestorQuery` - Upward walks for ownership and permission propagation
//! - `HierarchyService` - Row-source orchestration and guarded link writes
//!
//! The checks are pure and synchronous; only `HierarchyService` awaits the
//! row source.

pub mod ancestor_query;
pub mod error;
pub mod hierarchy_service;
pub mod loop_detector;

pub use ancestor_query::{has_qualifying_ancestor, AncestorQuery, AncestorStep};
pub use error::{CycleReason, HierarchyError};
pub use hierarchy_service::{HierarchyService, LinkRequest};
pub use loop_detector::{would_create_cycle, LoopDetector, LoopVerdict};
