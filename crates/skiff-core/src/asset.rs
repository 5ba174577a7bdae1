//! Graph nodes and the dependency graph.
//!
//! An [`Asset`] is the record a plugin produces for one item: where to
//! read it from, where it will be written, and what it depends on. The
//! [`Graph`] indexes assets by `(input, dependency type)` so that one
//! input referenced in two ways (say, statically and dynamically) keeps
//! two distinct nodes.

use crate::item::{DependencyType, Format};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Classification of a single outbound dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub kind: DependencyType,
    pub format: Format,
}

/// Dependencies of one kind, keyed by input, in the order the producing
/// plugin reported them.
pub type DependencyMap = IndexMap<String, Dependency>;

/// Two-level dependency buckets: kind, then input. Bucket iteration order
/// and entry iteration order are both insertion order.
pub type Dependencies = IndexMap<DependencyType, DependencyMap>;

/// Metadata record describing one graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// The source identifier (path or URL).
    pub input: String,
    /// Resolved local path the content is read from.
    pub file_path: PathBuf,
    /// Destination path the bundler will write to.
    pub output: PathBuf,
    /// Outbound dependency edges, bucketed by kind.
    pub dependencies: Dependencies,
    /// How the importer references this asset.
    pub kind: DependencyType,
    /// Format of the underlying source.
    pub format: Format,
}

impl Asset {
    /// Iterate all dependency edges, flattened across kind buckets,
    /// preserving insertion order.
    pub fn flat_dependencies(&self) -> impl Iterator<Item = (&str, &Dependency)> {
        self.dependencies
            .values()
            .flat_map(|bucket| bucket.iter().map(|(input, dep)| (input.as_str(), dep)))
    }
}

/// The dependency graph: input, then dependency type, then asset.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    entries: IndexMap<String, IndexMap<DependencyType, Asset>>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an asset under `(input, kind)`, replacing any previous one.
    pub fn insert(&mut self, input: String, kind: DependencyType, asset: Asset) {
        self.entries.entry(input).or_default().insert(kind, asset);
    }

    /// Look up the asset for `(input, kind)`.
    #[must_use]
    pub fn get(&self, input: &str, kind: DependencyType) -> Option<&Asset> {
        self.entries.get(input).and_then(|assets| assets.get(&kind))
    }

    #[must_use]
    pub fn contains(&self, input: &str, kind: DependencyType) -> bool {
        self.get(input, kind).is_some()
    }

    /// All assets recorded for an input, across dependency types.
    #[must_use]
    pub fn assets(&self, input: &str) -> Option<&IndexMap<DependencyType, Asset>> {
        self.entries.get(input)
    }

    /// Inputs in first-seen order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<DependencyType, Asset>)> {
        self.entries
            .iter()
            .map(|(input, assets)| (input.as_str(), assets))
    }

    /// Number of distinct inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
