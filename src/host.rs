use crate::blocks::{FileCache, Span};
use crate::canvas::CanvasEmbed;
use crate::propagate::RenameSpec;
use crate::selection::{LineRange, Selection};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug)]
pub enum HostError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    NotFound(String),
    Edit(String),
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

/// A resolved reference to a note, optionally narrowed to a block fragment.
/// `subpath`, when present, always starts with `#`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkPath {
    pub path: String,
    pub subpath: Option<String>,
    pub display: Option<String>,
}

impl LinkPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subpath: None,
            display: None,
        }
    }

    pub fn with_subpath(path: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subpath: Some(subpath.into()),
            display: None,
        }
    }

    pub fn full_target(&self) -> String {
        match &self.subpath {
            Some(sub) => format!("{}{}", self.path, sub),
            None => self.path.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedLink {
    pub link: LinkPath,
    pub text: String,
}

/// A raw link occurrence inside a referring document, as reported by the
/// host's reference index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLink {
    /// The link target as written, e.g. `Doc#^task-1`.
    pub target: String,
    /// The full link markup, e.g. `[[Doc#^task-1|label]]`.
    pub original: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRewrite {
    pub span: Span,
    pub new_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropPayload {
    Link(RenderedLink),
    Text(String),
}

/// The live editor holding the source document. Edits are applied as one
/// atomic transaction against the buffer's current version.
pub trait EditorBuffer {
    fn len(&self) -> usize;
    fn slice(&self, from: usize, to: usize) -> String;
    fn line_at(&self, offset: usize) -> LineRange;
    /// End offset of the foldable region starting at this line, if any.
    fn foldable_end(&self, line_from: usize) -> Option<usize>;
    fn selection_ranges(&self) -> Vec<Selection>;
    fn apply(&mut self, edits: &[TextEdit]) -> Result<(), HostError>;
}

/// The host's document storage.
pub trait NoteStore {
    fn exists(&self, path: &str) -> bool;
    fn create_note(&mut self, path: &str, body: &str) -> Result<(), HostError>;
    fn read_document(&self, path: &str) -> Result<String, HostError>;
    fn write_document(&mut self, path: &str, body: &str) -> Result<(), HostError>;
    /// Bulk text-link rewrite across many documents in one host-managed
    /// operation.
    fn apply_link_changes(
        &mut self,
        changes: &BTreeMap<String, Vec<LinkRewrite>>,
    ) -> Result<(), HostError>;
}

/// Read-only view of the host's structural and reference caches.
pub trait HostIndex {
    fn file_cache(&self, path: &str) -> Option<FileCache>;
    /// Visit every `(referring document, raw link)` pair in the corpus.
    fn iterate_refs(&self, visit: &mut dyn FnMut(&str, &RawLink));
    /// Resolve a link path written inside `from_doc` to the full path of the
    /// document it points at.
    fn resolve_link(&self, link_path: &str, from_doc: &str) -> Option<String>;
    /// Graph documents with at least one embed satisfying the filter.
    fn canvases_with(&self, filter: &dyn Fn(&str, &CanvasEmbed) -> bool) -> Vec<String>;
}

/// One-shot subscription to a metadata-cache invalidation for a single file.
/// Dropping the handle releases the subscription on every path.
pub trait CacheSubscription {
    /// Blocks until the cache event arrives or the budget elapses.
    /// Returns false on timeout.
    fn wait(&mut self, budget: Duration) -> bool;
}

pub trait MetadataEvents {
    fn subscribe(&self, path: &str) -> Box<dyn CacheSubscription>;
}

/// The destination view receiving the dragged content.
pub trait DropSurface {
    /// Path of the document backing this surface, if it has one.
    fn own_path(&self) -> Option<String>;
    fn draw(&mut self, payload: DropPayload) -> Result<(), HostError>;
    /// Let the open surface repair its own embedded references in place.
    fn update_links(&mut self, rename: &RenameSpec) -> Result<(), HostError>;
}
