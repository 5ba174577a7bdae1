#![allow(dead_code)]

//! Test plugins driving the public pipeline API.

use skiff_core::{
    dependency_items, Asset, Chunk, Context, CreatedBundle, Dependencies, Dependency,
    DependencyType, Format, Item, Plugin, Result, Source,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared observation handles that outlive the plugin once it is boxed
/// into a bundler.
#[derive(Clone, Default)]
pub struct Recorder {
    create_asset_calls: Arc<AtomicUsize>,
    create_chunk_calls: Arc<AtomicUsize>,
    create_bundle_calls: Arc<AtomicUsize>,
    optimize_calls: Arc<AtomicUsize>,
    asset_inputs: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn asset_count(&self) -> usize {
        self.create_asset_calls.load(Ordering::SeqCst)
    }

    pub fn chunk_count(&self) -> usize {
        self.create_chunk_calls.load(Ordering::SeqCst)
    }

    pub fn bundle_count(&self) -> usize {
        self.create_bundle_calls.load(Ordering::SeqCst)
    }

    pub fn optimize_count(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }

    pub fn asset_inputs(&self) -> Vec<String> {
        self.asset_inputs.lock().unwrap().clone()
    }
}

/// Configurable in-memory plugin: virtual sources, a declarative
/// dependency table, file paths rooted under a test dir.
pub struct StubPlugin {
    root: PathBuf,
    deps: HashMap<String, Vec<(String, DependencyType, Format)>>,
    recorder: Recorder,
}

impl StubPlugin {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            deps: HashMap::new(),
            recorder: Recorder::default(),
        }
    }

    /// Declare that `from` depends on `to`.
    pub fn dep(mut self, from: &str, to: &str, kind: DependencyType) -> Self {
        self.deps.entry(from.to_string()).or_default().push((
            to.to_string(),
            kind,
            Format::from_input(to),
        ));
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    fn file_path(&self, input: &str) -> PathBuf {
        self.root.join(input)
    }
}

impl Plugin for StubPlugin {
    fn name(&self) -> &str {
        "stub"
    }

    fn test(&self, _item: &Item, _context: &Context<'_>) -> bool {
        true
    }

    fn read_source(&self, input: &str, _context: &mut Context<'_>) -> Result<Option<Source>> {
        Ok(Some(Source::Text(format!("// module {input}\n"))))
    }

    fn create_asset(&self, item: &Item, context: &mut Context<'_>) -> Result<Option<Asset>> {
        self.recorder
            .create_asset_calls
            .fetch_add(1, Ordering::SeqCst);
        self.recorder
            .asset_inputs
            .lock()
            .unwrap()
            .push(item.input().to_string());

        let input = item.input();
        let mut dependencies = Dependencies::default();
        if let Some(edges) = self.deps.get(input) {
            for (dep_input, kind, format) in edges {
                dependencies.entry(*kind).or_default().insert(
                    dep_input.clone(),
                    Dependency {
                        kind: *kind,
                        format: *format,
                    },
                );
            }
        }
        Ok(Some(Asset {
            input: input.to_string(),
            file_path: self.file_path(input),
            output: context.output_for(input),
            dependencies,
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
        self.recorder
            .create_chunk_calls
            .fetch_add(1, Ordering::SeqCst);
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
        self.recorder
            .create_bundle_calls
            .fetch_add(1, Ordering::SeqCst);

        let bundler = context.bundler;
        let mut code = String::new();
        for item in std::iter::once(&chunk.item).chain(chunk.dependency_items.iter()) {
            let input = item.input().to_string();
            let source = bundler.read_source(&input, context)?;
            code.push_str(source.as_text().unwrap_or(""));
        }
        Ok(Some(CreatedBundle::Output(Source::Text(code))))
    }
}

/// Plugin that reports every chunk's output as already fresh.
pub struct UpToDatePlugin {
    root: PathBuf,
    recorder: Recorder,
}

impl UpToDatePlugin {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            recorder: Recorder::default(),
        }
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl Plugin for UpToDatePlugin {
    fn name(&self) -> &str {
        "up-to-date"
    }

    fn test(&self, _item: &Item, _context: &Context<'_>) -> bool {
        true
    }

    fn create_asset(&self, item: &Item, context: &mut Context<'_>) -> Result<Option<Asset>> {
        let input = item.input();
        Ok(Some(Asset {
            input: input.to_string(),
            file_path: self.root.join(input),
            output: context.output_for(input),
            dependencies: Dependencies::default(),
            kind: item.kind,
            format: item.format,
        }))
    }

    fn create_chunk(
        &self,
        item: &Item,
        _context: &mut Context<'_>,
        _chunk_list: &mut Vec<Item>,
    ) -> Result<Option<Chunk>> {
        Ok(Some(Chunk {
            item: item.clone(),
            dependency_items: Vec::new(),
        }))
    }

    fn create_bundle(
        &self,
        _chunk: &Chunk,
        _context: &mut Context<'_>,
    ) -> Result<Option<CreatedBundle>> {
        self.recorder
            .create_bundle_calls
            .fetch_add(1, Ordering::SeqCst);
        Ok(Some(CreatedBundle::UpToDate))
    }
}

/// Optimizer that only counts how often it runs.
pub struct CountingOptimizer {
    recorder: Recorder,
}

impl CountingOptimizer {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::default(),
        }
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl Plugin for CountingOptimizer {
    fn name(&self) -> &str {
        "counting-optimizer"
    }

    fn test(&self, _item: &Item, _context: &Context<'_>) -> bool {
        true
    }

    fn optimize_bundle(
        &self,
        _output: &Path,
        _bundle: &Source,
        _context: &mut Context<'_>,
    ) -> Result<Option<Source>> {
        self.recorder.optimize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}
