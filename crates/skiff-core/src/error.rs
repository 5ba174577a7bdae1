use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for skiff pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No plugin claimed a required hook for an input.
    #[error("no plugin handles `{operation}` for {input}")]
    NoPlugin {
        operation: &'static str,
        input: String,
    },

    /// A resource required by the pipeline does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// An import chain loops back onto one of its ancestors.
    ///
    /// The chain lists the full path, ending with the repeated input.
    #[error("circular dependency: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// A plugin hook failed for reasons of its own.
    #[error("[{plugin}] {hook}: {message}")]
    Plugin {
        plugin: String,
        hook: &'static str,
        message: String,
    },

    /// A filesystem stat failed with something other than not-found.
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A chunk references an input the graph never produced an asset for.
    #[error("no asset in graph for {input}")]
    MissingAsset { input: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Construct a plugin failure with the standard `[name] hook: message` shape.
    #[must_use]
    pub fn plugin(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }

    /// Whether this error is a missing-file condition.
    ///
    /// Freshness checks and cache stats recover from exactly this case;
    /// everything else propagates.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound(_) => true,
            Self::Io(source) => source.kind() == io::ErrorKind::NotFound,
            Self::Stat { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
