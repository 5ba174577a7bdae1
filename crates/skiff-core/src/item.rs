//! Units of work flowing through the pipeline.
//!
//! An [`Item`] names one input together with the import chain that led to
//! it. The chain (`history`, newest first) is what cycle detection and
//! cache scoping key on. Two items with the same input but different
//! [`DependencyType`]s are distinct graph nodes.

/// How an input is referenced by its importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyType {
    Import,
    Export,
    Fetch,
    DynamicImport,
    ServiceWorker,
    WebWorker,
}

/// Coarse classification of a source by path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    Html,
    Style,
    Script,
    Json,
    Wasm,
    Image,
    #[default]
    Unknown,
}

impl Format {
    /// Classify an input by its extension.
    ///
    /// Query strings and fragments are stripped first so remote inputs
    /// classify the same as local paths. Unrecognized suffixes are
    /// [`Format::Unknown`].
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let path = input.split(['?', '#']).next().unwrap_or(input);
        match path.rsplit('.').next().unwrap_or("") {
            "html" | "htm" => Self::Html,
            "css" => Self::Style,
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "mts" | "tsx" => Self::Script,
            "json" => Self::Json,
            "wasm" => Self::Wasm,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" | "avif" => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// Raw content of an input or an emitted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text(String),
    Bytes(Vec<u8>),
}

impl Source {
    /// View the content as bytes regardless of variant.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// View the content as text, if it is the text variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Final payload for one output file.
pub type Bundle = Source;

/// A unit of work: one input plus the import chain that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Input identifiers, newest first. `history[0]` is the active input;
    /// the rest is the chain of importers. Never empty.
    pub history: Vec<String>,
    /// How the importer references this input.
    pub kind: DependencyType,
    /// Format derived from the input's extension.
    pub format: Format,
}

impl Item {
    /// Item for an entry input: a one-element history, referenced as a
    /// plain import.
    #[must_use]
    pub fn from_input(input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            format: Format::from_input(&input),
            history: vec![input],
            kind: DependencyType::Import,
        }
    }

    /// Item for a dependency discovered while processing `parent`: the
    /// dependency becomes the active input, the parent's chain follows.
    #[must_use]
    pub fn dependency(
        input: impl Into<String>,
        kind: DependencyType,
        format: Format,
        parent: &Item,
    ) -> Self {
        let input = input.into();
        let mut history = Vec::with_capacity(parent.history.len() + 1);
        history.push(input);
        history.extend(parent.history.iter().cloned());
        Self {
            history,
            kind,
            format,
        }
    }

    /// The active input.
    #[must_use]
    pub fn input(&self) -> &str {
        self.history.first().map_or("", String::as_str)
    }
}
