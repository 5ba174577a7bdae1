//! Graph construction stage.
//!
//! Expands entry inputs breadth-first into a complete [`Graph`], asking
//! plugins for an [`Asset`] per node. Nodes whose output is provably
//! fresh reuse the asset from a prior run's graph instead.

use crate::asset::Asset;
use crate::bundler::Bundler;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::item::Item;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use tracing::{debug, error};

fn stat_mtime(path: &Path) -> Result<Option<std::time::SystemTime>> {
    match skiff_util::fs::mtime(path) {
        Ok(mtime) => Ok(Some(mtime)),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Whether a prior asset's output is out of date relative to its source.
/// A missing file on either side forces a rebuild; other stat failures
/// are fatal.
fn is_stale(asset: &Asset) -> Result<bool> {
    let Some(source_mtime) = stat_mtime(&asset.file_path)? else {
        return Ok(true);
    };
    let Some(output_mtime) = stat_mtime(&asset.output)? else {
        return Ok(true);
    };
    Ok(source_mtime > output_mtime)
}

impl Bundler {
    /// Expand `inputs` into `context.graph`.
    ///
    /// The graph already in the context (if any) is taken as the prior
    /// run's result: it is consulted for reuse, never mutated, and the
    /// evolving graph replaces it.
    pub(crate) fn build_graph(&self, inputs: &[String], context: &mut Context<'_>) -> Result<()> {
        let prior = std::mem::take(&mut context.graph);
        let mut worklist: VecDeque<Item> = inputs
            .iter()
            .map(|input| Item::from_input(input.clone()))
            .collect();

        while let Some(item) = worklist.pop_front() {
            let input = item.input().to_string();
            if context.graph.contains(&input, item.kind) {
                continue;
            }

            let prior_asset = prior.get(&input, item.kind);
            let needs_update = match prior_asset {
                None => true,
                Some(asset) => context.reload.includes(&input) || is_stale(asset)?,
            };

            let asset = match prior_asset {
                Some(asset) if !needs_update => {
                    debug!(input = %input, "asset up to date, reusing");
                    asset.clone()
                }
                _ => {
                    debug!(input = %input, "creating asset");
                    self.create_asset(&item, context)?
                }
            };
            context.graph.insert(input.clone(), item.kind, asset);

            if let Some(stored) = context.graph.get(&input, item.kind) {
                for (dep_input, dep) in stored.flat_dependencies() {
                    if dep_input == input {
                        continue;
                    }
                    if let Some(position) =
                        item.history.iter().position(|ancestor| ancestor == dep_input)
                    {
                        let mut chain: Vec<String> = item.history[..=position]
                            .iter()
                            .rev()
                            .cloned()
                            .collect();
                        chain.push(dep_input.to_string());
                        error!(chain = %chain.join(" -> "), "circular dependency");
                        return Err(Error::CircularDependency { chain });
                    }
                    worklist.push_back(Item::dependency(dep_input, dep.kind, dep.format, &item));
                }
            }
        }
        Ok(())
    }
}
