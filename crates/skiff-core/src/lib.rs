#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Plugin-driven build pipeline.
//!
//! Turns a set of entry inputs into a dependency graph, partitions the
//! graph into output chunks, and produces one payload per chunk. All
//! format knowledge lives in plugins; the engine coordinates dispatch,
//! incremental reuse, and the shared per-run [`Context`].

pub mod asset;
pub mod bundler;
pub mod cache;
pub mod chunks;
pub mod context;
pub mod emit;
pub mod error;
pub mod graph;
pub mod item;
pub mod plugin;

pub use asset::{Asset, Dependencies, Dependency, DependencyMap, Graph};
pub use bundler::{BundleResult, Bundler};
pub use chunks::{dependency_items, Chunk};
pub use context::{BundleOptions, Context, ImportMap, Reload};
pub use emit::Bundles;
pub use error::{Error, Result};
pub use item::{Bundle, DependencyType, Format, Item, Source};
pub use plugin::{BannerPlugin, CreatedBundle, FilePlugin, JsonPlugin, Plugin};
