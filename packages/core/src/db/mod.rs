//! Row Source Layer
//!
//! The hierarchy core consumes rows through the [`RowSource`] seam and
//! persists links through [`LinkStore`]. Query generation against real link
//! tables lives with the caller; this module ships the trait definitions and
//! an adjacency-list store used by the service layer and its tests.
//!
//! - [`MemoryLinkStore`] - Folder and task link tables held in memory
//! - [`LinkEvent`] - Broadcast after each committed link change

pub mod events;
mod memory_store;
pub mod row_source;

pub use events::LinkEvent;
pub use memory_store::MemoryLinkStore;
pub use row_source::{LinkStore, RowSource};
