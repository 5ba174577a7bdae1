//! Chunking stage.
//!
//! Visits each entry once and asks plugins to decide what one output
//! artifact contains. Plugins may append implicit entries to the chunk
//! list while it is being walked, which is how one source file (an HTML
//! page, say) fans out into several bundles.

use crate::asset::Graph;
use crate::bundler::Bundler;
use crate::context::Context;
use crate::error::Result;
use crate::item::{DependencyType, Item};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// A grouping decision: one output, and the items whose content
/// contributes to it. Identified by `(item.history[0], item.kind)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk's entry.
    pub item: Item,
    /// Transitive items included in this chunk's bundle, in discovery
    /// order.
    pub dependency_items: Vec<Item>,
}

/// Collect the transitive items contributing to `item`'s bundle.
///
/// Follows `Import` and `Export` edges breadth-first through the graph;
/// dependencies of other kinds (dynamic imports, workers, fetches) start
/// chunks of their own and are not included.
#[must_use]
pub fn dependency_items(item: &Item, graph: &Graph) -> Vec<Item> {
    let mut items = Vec::new();
    let mut seen: FxHashSet<(DependencyType, String)> = FxHashSet::default();
    seen.insert((item.kind, item.input().to_string()));

    let mut worklist: VecDeque<Item> = VecDeque::new();
    worklist.push_back(item.clone());

    while let Some(current) = worklist.pop_front() {
        let Some(asset) = graph.get(current.input(), current.kind) else {
            continue;
        };
        for (dep_input, dep) in asset.flat_dependencies() {
            if !matches!(dep.kind, DependencyType::Import | DependencyType::Export) {
                continue;
            }
            if !seen.insert((dep.kind, dep_input.to_string())) {
                continue;
            }
            let dep_item = Item::dependency(dep_input, dep.kind, dep.format, &current);
            items.push(dep_item.clone());
            worklist.push_back(dep_item);
        }
    }
    items
}

impl Bundler {
    /// Produce one chunk per unseen `(type, input)` pair in the chunk
    /// list, appending results to `context.chunks` in first-seen order.
    pub(crate) fn build_chunks(&self, inputs: &[String], context: &mut Context<'_>) -> Result<()> {
        let mut chunk_list: Vec<Item> = inputs
            .iter()
            .map(|input| Item::from_input(input.clone()))
            .collect();
        let mut created: FxHashSet<(DependencyType, String)> = FxHashSet::default();

        // Plugins append to chunk_list while it is walked; index-driven
        // on purpose.
        let mut index = 0;
        while index < chunk_list.len() {
            let item = chunk_list[index].clone();
            index += 1;

            if !created.insert((item.kind, item.input().to_string())) {
                debug!(input = %item.input(), "chunk already created");
                continue;
            }
            let chunk = self.create_chunk(&item, context, &mut chunk_list)?;
            context.chunks.push(chunk);
        }
        Ok(())
    }
}
