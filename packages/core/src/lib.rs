//! SpaceGraph Core
//!
//! Hierarchical entity graph shared by folder containment and task
//! parent/child relations. A node is linked under a parent either as an owned
//! child or as a bound reference: a live mirror of a node that already lives
//! elsewhere. Mirrors turn the hierarchy into a graph, so links are checked for
//! loops before they are written.
//!
//! # Architecture
//!
//! - **Rows in, verdicts out**: the core receives already-fetched rows and
//!   returns trees or decisions; it never generates queries
//! - **Pure checks**: tree building, bound propagation, search, loop detection
//!   and ancestor queries are synchronous functions over caller data
//! - **One async seam**: [`db::RowSource`] supplies rows, [`db::LinkStore`]
//!   persists links after a negative loop verdict
//!
//! # Modules
//!
//! - [`models`] - Rows, links and tree nodes
//! - [`tree`] - Tree reconstruction, bound propagation and search
//! - [`services`] - Loop detection, ancestor queries, `HierarchyService`
//! - [`db`] - Row source traits and the in-memory link store
//! - [`config`] - Traversal and reconstruction settings

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use config::{DuplicatePathPolicy, HierarchyConfig};
pub use models::*;
pub use services::*;
