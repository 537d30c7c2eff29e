//! Tree Utilities
//!
//! Pure functions over rows and materialized trees:
//!
//! - [`build_tree`] / [`build_row_tree`] - Flat rows to nested forest
//! - [`propagate_bound`] - Force bound status down mirrored subtrees
//! - [`find_by_id`] - Depth-first search with a bound filter

pub mod bound;
pub mod builder;
pub mod search;

pub use bound::{propagate_bound, propagate_bound_in_place, propagate_forest};
pub use builder::{build_row_tree, build_tree};
pub use search::{contains_descendant, find_by_id, find_in_forest, find_preferring_unbound};
