//! Plugin protocol for the pipeline.
//!
//! Every plugin offers a mandatory [`Plugin::test`] predicate plus any
//! subset of six hooks. A hook that returns `Ok(None)` does not claim the
//! item; the dispatcher moves on to the next plugin in list order. Hooks
//! with a transform shape (`transform_source`, `optimize_bundle`) are
//! chained instead: every matching plugin sees the previous plugin's
//! output.
//!
//! ## Example
//!
//! ```ignore
//! use skiff_core::{Context, Item, Plugin, Result, Source};
//!
//! struct TxtPlugin;
//!
//! impl Plugin for TxtPlugin {
//!     fn name(&self) -> &str { "txt" }
//!
//!     fn test(&self, item: &Item, _context: &Context<'_>) -> bool {
//!         item.input().ends_with(".txt")
//!     }
//!
//!     fn read_source(&self, input: &str, _context: &mut Context<'_>) -> Result<Option<Source>> {
//!         Ok(Some(Source::Text(std::fs::read_to_string(input)?)))
//!     }
//! }
//! ```

use crate::asset::{Asset, Dependencies};
use crate::chunks::{dependency_items, Chunk};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::item::{Bundle, Format, Item, Source};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a `create_bundle` hook that claimed a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatedBundle {
    /// A fresh payload for the chunk's output.
    Output(Bundle),
    /// The on-disk output is already newer than the contributing source;
    /// nothing to write.
    UpToDate,
}

/// An external collaborator implementing part of the pipeline.
///
/// All hooks default to `Ok(None)` ("not my item"), so a plugin only
/// implements the capabilities it has. `test` gates every hook: the
/// dispatcher never calls a hook on an item the predicate rejected.
pub trait Plugin: Send + Sync {
    /// Plugin name for diagnostics and error messages.
    fn name(&self) -> &str;

    /// Whether this plugin handles the given item. Typically gates on
    /// [`Item::format`] or [`Item::kind`].
    fn test(&self, item: &Item, context: &Context<'_>) -> bool;

    /// Materialize the raw bytes or text for an input.
    fn read_source(&self, _input: &str, _context: &mut Context<'_>) -> Result<Option<Source>> {
        Ok(None)
    }

    /// Rewrite a source before asset creation. Chained: receives the
    /// previous plugin's output, returns `None` to leave it unchanged.
    ///
    /// The engine's stages never call this; it exists for plugins that
    /// re-enter through [`Context::bundler`].
    fn transform_source(
        &self,
        _bundle_entry: &str,
        _item: &Item,
        _source: &Source,
        _context: &mut Context<'_>,
    ) -> Result<Option<Source>> {
        Ok(None)
    }

    /// Parse an item and enumerate its outbound dependencies.
    fn create_asset(&self, _item: &Item, _context: &mut Context<'_>) -> Result<Option<Asset>> {
        Ok(None)
    }

    /// Decide chunk membership for an item. May append implicit entries
    /// (a script spawned by an HTML page, say) to `chunk_list`.
    fn create_chunk(
        &self,
        _item: &Item,
        _context: &mut Context<'_>,
        _chunk_list: &mut Vec<Item>,
    ) -> Result<Option<Chunk>> {
        Ok(None)
    }

    /// Produce the final payload for a chunk, or report it up to date.
    fn create_bundle(
        &self,
        _chunk: &Chunk,
        _context: &mut Context<'_>,
    ) -> Result<Option<CreatedBundle>> {
        Ok(None)
    }

    /// Post-process an emitted bundle. Chained like `transform_source`.
    fn optimize_bundle(
        &self,
        _output: &Path,
        _bundle: &Bundle,
        _context: &mut Context<'_>,
    ) -> Result<Option<Bundle>> {
        Ok(None)
    }
}

// ============================================================================
// Built-in plugins
// ============================================================================

/// Whether `output` is at least as new as `file_path`. A missing file on
/// either side means the output must be rebuilt.
fn output_is_fresh(file_path: &Path, output: &Path) -> Result<bool> {
    let source_mtime = match skiff_util::fs::mtime(file_path) {
        Ok(mtime) => mtime,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(Error::Stat {
                path: file_path.to_path_buf(),
                source,
            })
        }
    };
    let output_mtime = match skiff_util::fs::mtime(output) {
        Ok(mtime) => mtime,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(Error::Stat {
                path: output.to_path_buf(),
                source,
            })
        }
    };
    Ok(source_mtime <= output_mtime)
}

/// Catch-all plugin: copies any input byte-for-byte to a hashed name
/// under the deps dir. Claims every item, so it belongs last in the
/// plugin list.
pub struct FilePlugin;

impl Plugin for FilePlugin {
    fn name(&self) -> &str {
        "file"
    }

    fn test(&self, _item: &Item, _context: &Context<'_>) -> bool {
        true
    }

    fn read_source(&self, input: &str, _context: &mut Context<'_>) -> Result<Option<Source>> {
        let path = Path::new(input);
        Ok(Some(Source::Bytes(fs::read(path)?)))
    }

    fn create_asset(&self, item: &Item, context: &mut Context<'_>) -> Result<Option<Asset>> {
        let input = item.input();
        Ok(Some(Asset {
            input: input.to_string(),
            file_path: PathBuf::from(input),
            output: context.output_for(input),
            dependencies: Dependencies::default(),
            kind: item.kind,
            format: item.format,
        }))
    }

    fn create_chunk(
        &self,
        item: &Item,
        context: &mut Context<'_>,
        _chunk_list: &mut Vec<Item>,
    ) -> Result<Option<Chunk>> {
        Ok(Some(Chunk {
            item: item.clone(),
            dependency_items: dependency_items(item, &context.graph),
        }))
    }

    fn create_bundle(
        &self,
        chunk: &Chunk,
        context: &mut Context<'_>,
    ) -> Result<Option<CreatedBundle>> {
        let input = chunk.item.input().to_string();
        let Some(asset) = context.graph.get(&input, chunk.item.kind) else {
            return Err(Error::MissingAsset { input });
        };
        let file_path = asset.file_path.clone();
        let output = asset.output.clone();

        if !context.reload.includes(&input) && output_is_fresh(&file_path, &output)? {
            return Ok(Some(CreatedBundle::UpToDate));
        }

        let bundler = context.bundler;
        let source = bundler.read_source(&input, context)?;
        Ok(Some(CreatedBundle::Output(source)))
    }
}

/// Copy plugin scoped to JSON inputs. Same semantics as [`FilePlugin`],
/// kept separate so callers can order other plugins around JSON handling.
pub struct JsonPlugin;

impl Plugin for JsonPlugin {
    fn name(&self) -> &str {
        "json"
    }

    fn test(&self, item: &Item, _context: &Context<'_>) -> bool {
        item.format == Format::Json
    }

    fn read_source(&self, input: &str, context: &mut Context<'_>) -> Result<Option<Source>> {
        FilePlugin.read_source(input, context)
    }

    fn create_asset(&self, item: &Item, context: &mut Context<'_>) -> Result<Option<Asset>> {
        FilePlugin.create_asset(item, context)
    }

    fn create_chunk(
        &self,
        item: &Item,
        context: &mut Context<'_>,
        chunk_list: &mut Vec<Item>,
    ) -> Result<Option<Chunk>> {
        FilePlugin.create_chunk(item, context, chunk_list)
    }

    fn create_bundle(
        &self,
        chunk: &Chunk,
        context: &mut Context<'_>,
    ) -> Result<Option<CreatedBundle>> {
        FilePlugin.create_bundle(chunk, context)
    }
}

/// Optimizer that prepends a banner and/or appends a footer to text
/// bundles of script or style format.
pub struct BannerPlugin {
    banner: Option<String>,
    footer: Option<String>,
}

impl BannerPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: None,
            footer: None,
        }
    }

    /// Set the banner (prepended to output).
    #[must_use]
    pub fn banner(mut self, text: impl Into<String>) -> Self {
        self.banner = Some(text.into());
        self
    }

    /// Set the footer (appended to output).
    #[must_use]
    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }
}

impl Default for BannerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for BannerPlugin {
    fn name(&self) -> &str {
        "banner"
    }

    fn test(&self, item: &Item, _context: &Context<'_>) -> bool {
        matches!(item.format, Format::Script | Format::Style)
    }

    fn optimize_bundle(
        &self,
        _output: &Path,
        bundle: &Bundle,
        _context: &mut Context<'_>,
    ) -> Result<Option<Bundle>> {
        if self.banner.is_none() && self.footer.is_none() {
            return Ok(None);
        }
        let Some(code) = bundle.as_text() else {
            return Ok(None);
        };

        let mut result = String::new();
        if let Some(banner) = &self.banner {
            result.push_str(banner);
            result.push('\n');
        }
        result.push_str(code);
        if let Some(footer) = &self.footer {
            result.push('\n');
            result.push_str(footer);
        }
        Ok(Some(Bundle::Text(result)))
    }
}
