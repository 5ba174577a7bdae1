//! Bundle emission stage.
//!
//! Asks plugins for each chunk's payload and stores it under the entry
//! asset's output path. Persistence is the caller's concern; the stage
//! only fills `context.bundles`.

use crate::bundler::Bundler;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::item::Bundle;
use crate::plugin::CreatedBundle;
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Emitted payloads in chunk order, keyed by output path.
pub type Bundles = IndexMap<PathBuf, Bundle>;

impl Bundler {
    /// Produce a bundle per chunk in `context.chunks`, in order.
    ///
    /// Chunks reported up to date are logged and skipped, optimizers
    /// included. When `optimize` is set, the stored payload is replaced
    /// by the optimizer chain's result under the same key.
    pub(crate) fn build_bundles(&self, context: &mut Context<'_>) -> Result<()> {
        let chunks = context.chunks.clone();
        for chunk in &chunks {
            match self.create_bundle(chunk, context)? {
                CreatedBundle::UpToDate => {
                    info!(input = %chunk.item.input(), "bundle up to date");
                    debug!(input = %chunk.item.input(), "skipping optimizers");
                }
                CreatedBundle::Output(bundle) => {
                    let input = chunk.item.input();
                    let Some(asset) = context.graph.get(input, chunk.item.kind) else {
                        return Err(Error::MissingAsset {
                            input: input.to_string(),
                        });
                    };
                    let output = asset.output.clone();
                    context.bundles.insert(output.clone(), bundle.clone());
                    if context.optimize {
                        let optimized = self.optimize_bundle(&output, bundle, context)?;
                        context.bundles.insert(output.clone(), optimized);
                    }
                    info!(output = %output.display(), "bundle emitted");
                }
            }
        }
        Ok(())
    }
}
