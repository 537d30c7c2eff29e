//! Hierarchy configuration

use serde::{Deserialize, Serialize};

/// Default bound on traversal depth (folders and tasks are expected to be shallow)
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What tree reconstruction does with two rows sharing the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePathPolicy {
    /// Fail with `HierarchyError::MalformedInput`
    #[default]
    Reject,
    /// Keep the first row and log the rest
    KeepFirst,
}

/// Configuration for hierarchy traversal and tree reconstruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HierarchyConfig {
    /// Maximum number of hops followed by traversals and ancestor queries
    pub max_depth: usize,
    pub duplicate_paths: DuplicatePathPolicy,
    /// Whether ancestor queries walk through bound links
    pub include_bound_ancestors: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicate_paths: DuplicatePathPolicy::default(),
            include_bound_ancestors: true,
        }
    }
}

impl HierarchyConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_duplicate_paths(mut self, policy: DuplicatePathPolicy) -> Self {
        self.duplicate_paths = policy;
        self
    }
}
