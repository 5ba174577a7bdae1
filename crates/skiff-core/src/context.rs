//! Per-run shared state.
//!
//! A [`Context`] is constructed from [`BundleOptions`] at the start of a
//! pipeline run and threaded mutably through every stage and every plugin
//! hook. It carries configuration, the memo tables for sources and cached
//! transforms, and the evolving graph/chunks/bundles. It is owned by
//! exactly one run; plugins must not retain references across runs.

use crate::asset::Graph;
use crate::bundler::Bundler;
use crate::chunks::Chunk;
use crate::emit::Bundles;
use crate::item::Source;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Module alias map, the shape of an import-map JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportMap {
    #[serde(default)]
    pub imports: HashMap<String, String>,
    #[serde(default)]
    pub scopes: HashMap<String, HashMap<String, String>>,
}

impl ImportMap {
    /// Resolve a specifier against the top-level imports: exact match
    /// first, then the longest matching trailing-slash prefix.
    ///
    /// Full specifier resolution (scopes, relative keys) is a plugin
    /// concern; this covers the alias lookups plugins ask for.
    #[must_use]
    pub fn resolve(&self, specifier: &str) -> Option<String> {
        if let Some(target) = self.imports.get(specifier) {
            return Some(target.clone());
        }
        self.imports
            .iter()
            .filter(|(key, _)| key.ends_with('/') && specifier.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(key, target)| format!("{target}{}", &specifier[key.len()..]))
    }
}

/// Force-rebuild policy for the graph builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reload {
    /// Rebuild every node regardless of timestamps.
    All,
    /// Rebuild only the listed inputs.
    Only(Vec<String>),
    /// Rebuild nothing that timestamps prove fresh.
    #[default]
    None,
}

impl Reload {
    /// Whether the policy forces a rebuild of `input`.
    #[must_use]
    pub fn includes(&self, input: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(inputs) => inputs.iter().any(|candidate| candidate == input),
            Self::None => false,
        }
    }
}

/// Options recognized by `bundle`, `create_graph`, `create_chunks`, and
/// `create_bundles`.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Alias map fed to plugins.
    pub import_map: ImportMap,
    /// Input-to-output overrides.
    pub output_map: HashMap<String, PathBuf>,
    /// Seed for the in-memory source memo.
    pub sources: FxHashMap<String, Source>,
    /// Seed for the in-memory transform cache.
    pub cache: FxHashMap<PathBuf, Source>,
    /// Pre-existing graph for incremental runs.
    pub graph: Graph,
    /// Pre-existing chunk accumulator.
    pub chunks: Vec<Chunk>,
    /// Pre-existing bundle accumulator.
    pub bundles: Bundles,
    /// Force-rebuild policy.
    pub reload: Reload,
    /// Run optimizer hooks over emitted bundles.
    pub optimize: bool,
    /// Suppress informational output; plugins consult this too.
    pub quiet: bool,
    /// Output root.
    pub out_dir_path: PathBuf,
    /// Override for the dependency output dir (default `<out>/deps`).
    pub deps_dir_path: Option<PathBuf>,
    /// Override for the cache dir (default `<out>/.cache`).
    pub cache_dir_path: Option<PathBuf>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            import_map: ImportMap::default(),
            output_map: HashMap::new(),
            sources: FxHashMap::default(),
            cache: FxHashMap::default(),
            graph: Graph::new(),
            chunks: Vec::new(),
            bundles: Bundles::default(),
            reload: Reload::default(),
            optimize: false,
            quiet: false,
            out_dir_path: PathBuf::from("dist"),
            deps_dir_path: None,
            cache_dir_path: None,
        }
    }
}

/// State shared across all three stages and all plugins for one run.
pub struct Context<'a> {
    pub import_map: ImportMap,
    pub output_map: HashMap<String, PathBuf>,
    pub reload: Reload,
    pub optimize: bool,
    pub quiet: bool,
    pub out_dir_path: PathBuf,
    pub deps_dir_path: PathBuf,
    pub cache_dir_path: PathBuf,
    /// Memo: input to raw content.
    pub sources: FxHashMap<String, Source>,
    /// Memo: cache file path to cached transform output.
    pub cache: FxHashMap<PathBuf, Source>,
    /// Populated by the graph builder.
    pub graph: Graph,
    /// Populated by the chunker.
    pub chunks: Vec<Chunk>,
    /// Populated by the bundle emitter, keyed by output path.
    pub bundles: Bundles,
    /// Back-reference so plugins can re-enter the dispatcher.
    pub bundler: &'a Bundler,
}

impl<'a> Context<'a> {
    /// Build a fresh per-run context from caller options, deriving the
    /// dependency and cache dirs from the output root when not overridden.
    #[must_use]
    pub fn new(bundler: &'a Bundler, options: BundleOptions) -> Self {
        let deps_dir_path = options
            .deps_dir_path
            .unwrap_or_else(|| options.out_dir_path.join("deps"));
        let cache_dir_path = options
            .cache_dir_path
            .unwrap_or_else(|| options.out_dir_path.join(".cache"));
        Self {
            import_map: options.import_map,
            output_map: options.output_map,
            reload: options.reload,
            optimize: options.optimize,
            quiet: options.quiet,
            out_dir_path: options.out_dir_path,
            deps_dir_path,
            cache_dir_path,
            sources: options.sources,
            cache: options.cache,
            graph: options.graph,
            chunks: options.chunks,
            bundles: options.bundles,
            bundler,
        }
    }

    /// Destination path for an input: the `output_map` override when one
    /// exists, otherwise a content-addressed name under the deps dir that
    /// keeps the input's extension.
    #[must_use]
    pub fn output_for(&self, input: &str) -> PathBuf {
        if let Some(output) = self.output_map.get(input) {
            return output.clone();
        }
        let path = input.split(['?', '#']).next().unwrap_or(input);
        let digest = skiff_util::hash::blake3_str(input);
        let name = match std::path::Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{digest}.{ext}"),
            None => digest,
        };
        self.deps_dir_path.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_derived_paths() {
        let bundler = Bundler::new();
        let context = Context::new(&bundler, BundleOptions::default());
        assert_eq!(context.out_dir_path, PathBuf::from("dist"));
        assert_eq!(context.deps_dir_path, PathBuf::from("dist/deps"));
        assert_eq!(context.cache_dir_path, PathBuf::from("dist/.cache"));
    }

    #[test]
    fn test_derived_paths_respect_overrides() {
        let bundler = Bundler::new();
        let options = BundleOptions {
            out_dir_path: PathBuf::from("build"),
            deps_dir_path: Some(PathBuf::from("build/vendor")),
            ..Default::default()
        };
        let context = Context::new(&bundler, options);
        assert_eq!(context.deps_dir_path, PathBuf::from("build/vendor"));
        assert_eq!(context.cache_dir_path, PathBuf::from("build/.cache"));
    }

    #[test]
    fn test_output_for_uses_override() {
        let bundler = Bundler::new();
        let mut options = BundleOptions::default();
        options
            .output_map
            .insert("src/index.html".to_string(), PathBuf::from("dist/index.html"));
        let context = Context::new(&bundler, options);
        assert_eq!(
            context.output_for("src/index.html"),
            PathBuf::from("dist/index.html")
        );
    }

    #[test]
    fn test_output_for_is_hex_named_under_deps() {
        let bundler = Bundler::new();
        let context = Context::new(&bundler, BundleOptions::default());
        let output = context.output_for("src/index.tsx");
        assert!(output.starts_with("dist/deps"));
        let name = output.file_name().unwrap().to_str().unwrap();
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(stem.len(), 64);
        assert_eq!(ext, "tsx");
    }

    #[test]
    fn test_import_map_resolve() {
        let mut import_map = ImportMap::default();
        import_map
            .imports
            .insert("react".to_string(), "https://esm.sh/react".to_string());
        import_map
            .imports
            .insert("lib/".to_string(), "./src/lib/".to_string());

        assert_eq!(
            import_map.resolve("react"),
            Some("https://esm.sh/react".to_string())
        );
        assert_eq!(
            import_map.resolve("lib/math.ts"),
            Some("./src/lib/math.ts".to_string())
        );
        assert_eq!(import_map.resolve("unknown"), None);
    }

    #[test]
    fn test_reload_policies() {
        assert!(Reload::All.includes("anything"));
        assert!(!Reload::None.includes("anything"));
        let only = Reload::Only(vec!["b.ts".to_string()]);
        assert!(only.includes("b.ts"));
        assert!(!only.includes("a.ts"));
    }
}
