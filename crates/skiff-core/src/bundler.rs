//! The bundler: plugin dispatch plus the three-stage pipeline.
//!
//! ## Architecture
//!
//! 1. **Graph** - expand entry inputs into a dependency graph
//! 2. **Chunks** - partition the graph into output chunks
//! 3. **Bundles** - produce the final payload for each chunk
//!
//! All three stages share one [`Context`] and delegate the actual work to
//! plugins through the dispatch methods on [`Bundler`]. Plugins are
//! consulted in the order they were registered; earlier plugins win.
//!
//! ## Usage
//!
//! ```ignore
//! use skiff_core::{BundleOptions, Bundler, FilePlugin};
//!
//! let bundler = Bundler::new().plugin(Box::new(FilePlugin));
//! let result = bundler.bundle(&["src/logo.svg".to_string()], BundleOptions::default())?;
//! for (output, bundle) in &result.bundles {
//!     std::fs::write(output, bundle.as_bytes())?;
//! }
//! ```

use crate::asset::{Asset, Graph};
use crate::chunks::Chunk;
use crate::context::{BundleOptions, Context};
use crate::emit::Bundles;
use crate::error::{Error, Result};
use crate::item::{Bundle, Item, Source};
use crate::plugin::{CreatedBundle, Plugin};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Everything a pipeline run produced.
#[derive(Debug)]
pub struct BundleResult {
    /// In-memory transform cache, keyed by cache file path.
    pub cache: FxHashMap<PathBuf, Source>,
    /// The dependency graph.
    pub graph: Graph,
    /// Chunks in emission order.
    pub chunks: Vec<Chunk>,
    /// Emitted payloads, keyed by output path.
    pub bundles: Bundles,
}

/// The pipeline engine. Owns the ordered plugin list; all per-run state
/// lives in a [`Context`].
pub struct Bundler {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Bundler {
    /// Create a bundler with no plugins registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Add a plugin. Registration order is dispatch order.
    #[must_use]
    pub fn plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add multiple plugins at once.
    #[must_use]
    pub fn plugins(mut self, plugins: Vec<Box<dyn Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Run all three stages over a fresh context and return everything
    /// the run produced.
    pub fn bundle(&self, inputs: &[String], options: BundleOptions) -> Result<BundleResult> {
        let mut context = Context::new(self, options);
        self.build_graph(inputs, &mut context)?;
        self.build_chunks(inputs, &mut context)?;
        self.build_bundles(&mut context)?;
        Ok(BundleResult {
            cache: context.cache,
            graph: context.graph,
            chunks: context.chunks,
            bundles: context.bundles,
        })
    }

    /// Run only the graph stage.
    pub fn create_graph(&self, inputs: &[String], options: BundleOptions) -> Result<Graph> {
        let mut context = Context::new(self, options);
        self.build_graph(inputs, &mut context)?;
        Ok(context.graph)
    }

    /// Run only the chunk stage against an existing graph.
    pub fn create_chunks(
        &self,
        inputs: &[String],
        graph: Graph,
        options: BundleOptions,
    ) -> Result<Vec<Chunk>> {
        let mut context = Context::new(self, options);
        context.graph = graph;
        self.build_chunks(inputs, &mut context)?;
        Ok(context.chunks)
    }

    /// Run only the bundle stage against existing chunks and graph.
    pub fn create_bundles(
        &self,
        chunks: Vec<Chunk>,
        graph: Graph,
        options: BundleOptions,
    ) -> Result<Bundles> {
        let mut context = Context::new(self, options);
        context.graph = graph;
        context.chunks = chunks;
        self.build_bundles(&mut context)?;
        Ok(context.bundles)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Materialize the content of an input, memoized through
    /// [`Context::sources`].
    ///
    /// A missing underlying resource surfaces as
    /// [`Error::FileNotFound`]; every other plugin failure propagates
    /// unchanged.
    pub fn read_source(&self, input: &str, context: &mut Context<'_>) -> Result<Source> {
        if let Some(source) = context.sources.get(input) {
            return Ok(source.clone());
        }
        let item = Item::from_input(input);
        for plugin in &self.plugins {
            if !plugin.test(&item, context) {
                continue;
            }
            match plugin.read_source(input, context) {
                Ok(Some(source)) => {
                    trace!(plugin = plugin.name(), input, "read source");
                    context.sources.insert(input.to_string(), source.clone());
                    return Ok(source);
                }
                Ok(None) => {}
                Err(error) if error.is_not_found() => {
                    return Err(Error::FileNotFound(input.to_string()))
                }
                Err(error) => return Err(error),
            }
        }
        Err(Error::NoPlugin {
            operation: "read_source",
            input: input.to_string(),
        })
    }

    /// Chain the `transform_source` hook of every matching plugin over
    /// the item's source, starting from the memoized read.
    ///
    /// Not called by the stages; exists for plugin re-entry. The result
    /// is recomputed on every call.
    pub fn transform_source(
        &self,
        bundle_entry: &str,
        item: &Item,
        context: &mut Context<'_>,
    ) -> Result<Source> {
        let mut source = self.read_source(item.input(), context)?;
        for plugin in &self.plugins {
            if !plugin.test(item, context) {
                continue;
            }
            if let Some(transformed) =
                plugin.transform_source(bundle_entry, item, &source, context)?
            {
                trace!(plugin = plugin.name(), input = item.input(), "transformed source");
                source = transformed;
            }
        }
        Ok(source)
    }

    /// Ask the first claiming plugin to describe an item as an asset.
    pub fn create_asset(&self, item: &Item, context: &mut Context<'_>) -> Result<Asset> {
        for plugin in &self.plugins {
            if !plugin.test(item, context) {
                continue;
            }
            if let Some(asset) = plugin.create_asset(item, context)? {
                trace!(plugin = plugin.name(), input = item.input(), "created asset");
                return Ok(asset);
            }
        }
        Err(Error::NoPlugin {
            operation: "create_asset",
            input: item.input().to_string(),
        })
    }

    /// Ask the first claiming plugin to produce a chunk for an item.
    /// Plugins may push implicit entries onto `chunk_list`.
    pub fn create_chunk(
        &self,
        item: &Item,
        context: &mut Context<'_>,
        chunk_list: &mut Vec<Item>,
    ) -> Result<Chunk> {
        for plugin in &self.plugins {
            if !plugin.test(item, context) {
                continue;
            }
            if let Some(chunk) = plugin.create_chunk(item, context, chunk_list)? {
                trace!(plugin = plugin.name(), input = item.input(), "created chunk");
                return Ok(chunk);
            }
        }
        Err(Error::NoPlugin {
            operation: "create_chunk",
            input: item.input().to_string(),
        })
    }

    /// Ask the first claiming plugin for a chunk's payload, which may be
    /// the observation that the output is already fresh.
    pub fn create_bundle(
        &self,
        chunk: &Chunk,
        context: &mut Context<'_>,
    ) -> Result<CreatedBundle> {
        for plugin in &self.plugins {
            if !plugin.test(&chunk.item, context) {
                continue;
            }
            if let Some(created) = plugin.create_bundle(chunk, context)? {
                trace!(plugin = plugin.name(), input = chunk.item.input(), "created bundle");
                return Ok(created);
            }
        }
        Err(Error::NoPlugin {
            operation: "create_bundle",
            input: chunk.item.input().to_string(),
        })
    }

    /// Chain the `optimize_bundle` hook of every matching plugin over an
    /// emitted payload. Matching is gated on a probe item built from the
    /// output path.
    pub fn optimize_bundle(
        &self,
        output: &Path,
        bundle: Bundle,
        context: &mut Context<'_>,
    ) -> Result<Bundle> {
        let item = Item::from_input(output.display().to_string());
        let mut bundle = bundle;
        for plugin in &self.plugins {
            if !plugin.test(&item, context) {
                continue;
            }
            if let Some(optimized) = plugin.optimize_bundle(output, &bundle, context)? {
                trace!(plugin = plugin.name(), output = %output.display(), "optimized bundle");
                bundle = optimized;
            }
        }
        Ok(bundle)
    }
}

impl Default for Bundler {
    fn default() -> Self {
        Self::new()
    }
}
