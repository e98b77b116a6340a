//! In-memory fakes for the host-side traits, shared by the module tests.

use crate::blocks::{FileCache, Span};
use crate::canvas::CanvasEmbed;
use crate::confirm::{NamePrompt, PromptReply, PromptRequest};
use crate::host::{
    CacheSubscription, DropPayload, DropSurface, EditorBuffer, HostError, HostIndex, LinkRewrite,
    MetadataEvents, NoteStore, RawLink, TextEdit,
};
use crate::markdown::{CANVAS_EXTENSION, MARKDOWN_EXTENSION};
use crate::propagate::RenameSpec;
use crate::selection::{LineRange, Selection};
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

pub struct FakeEditor {
    pub text: String,
    selections: Vec<Selection>,
    folds: BTreeMap<usize, usize>,
}

impl FakeEditor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            selections: Vec::new(),
            folds: BTreeMap::new(),
        }
    }

    pub fn select(&mut self, ranges: &[Selection]) {
        self.selections = ranges.to_vec();
    }

    pub fn fold(&mut self, line_from: usize, end: usize) {
        self.folds.insert(line_from, end);
    }
}

impl EditorBuffer for FakeEditor {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.text[from..to].to_string()
    }

    fn line_at(&self, offset: usize) -> LineRange {
        let mut from = 0;
        for line in self.text.split_inclusive('\n') {
            let end = from + line.len();
            let text = line.strip_suffix('\n').unwrap_or(line);
            if offset < end || end == self.text.len() {
                return LineRange {
                    from,
                    to: from + text.len(),
                    text: text.to_string(),
                };
            }
            from = end;
        }
        LineRange {
            from: self.text.len(),
            to: self.text.len(),
            text: String::new(),
        }
    }

    fn foldable_end(&self, line_from: usize) -> Option<usize> {
        self.folds.get(&line_from).copied()
    }

    fn selection_ranges(&self) -> Vec<Selection> {
        self.selections.clone()
    }

    fn apply(&mut self, edits: &[TextEdit]) -> Result<(), HostError> {
        let mut sorted = edits.to_vec();
        sorted.sort_by(|a, b| b.from.cmp(&a.from));
        for edit in sorted {
            if edit.from > edit.to || edit.to > self.text.len() {
                return Err(HostError::Edit(format!("edit out of bounds: {edit:?}")));
            }
            self.text.replace_range(edit.from..edit.to, &edit.insert);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub documents: BTreeMap<String, String>,
    pub created: Vec<String>,
    pub writes: Vec<String>,
    pub link_change_batches: Vec<BTreeMap<String, Vec<LinkRewrite>>>,
}

impl FakeStore {
    pub fn put(&mut self, path: &str, body: &str) {
        self.documents.insert(path.to_string(), body.to_string());
    }
}

impl NoteStore for FakeStore {
    fn exists(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    fn create_note(&mut self, path: &str, body: &str) -> Result<(), HostError> {
        if self.documents.contains_key(path) {
            return Err(HostError::Edit(format!("{path} already exists")));
        }
        self.documents.insert(path.to_string(), body.to_string());
        self.created.push(path.to_string());
        Ok(())
    }

    fn read_document(&self, path: &str) -> Result<String, HostError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }

    fn write_document(&mut self, path: &str, body: &str) -> Result<(), HostError> {
        self.documents.insert(path.to_string(), body.to_string());
        self.writes.push(path.to_string());
        Ok(())
    }

    fn apply_link_changes(
        &mut self,
        changes: &BTreeMap<String, Vec<LinkRewrite>>,
    ) -> Result<(), HostError> {
        self.link_change_batches.push(changes.clone());
        for (doc, rewrites) in changes {
            let Some(body) = self.documents.get_mut(doc) else {
                continue;
            };
            let mut sorted = rewrites.clone();
            sorted.sort_by(|a, b| b.span.start.cmp(&a.span.start));
            for rewrite in sorted {
                if rewrite.span.start <= rewrite.span.end && rewrite.span.end <= body.len() {
                    body.replace_range(rewrite.span.start..rewrite.span.end, &rewrite.new_text);
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIndex {
    caches: BTreeMap<String, FileCache>,
    refs: Vec<(String, RawLink)>,
    embeds: Vec<(String, CanvasEmbed)>,
}

impl FakeIndex {
    pub fn set_cache(&mut self, path: &str, cache: FileCache) {
        self.caches.insert(path.to_string(), cache);
    }

    pub fn add_ref(&mut self, doc: &str, target: &str, original: &str, start: usize, end: usize) {
        self.refs.push((
            doc.to_string(),
            RawLink {
                target: target.to_string(),
                original: original.to_string(),
                span: Span::new(start, end),
            },
        ));
    }

    pub fn add_canvas_embed(&mut self, path: &str, file: &str, subpath: Option<&str>) {
        self.embeds.push((
            path.to_string(),
            CanvasEmbed {
                file: Some(file.to_string()),
                subpath: subpath.map(str::to_string),
            },
        ));
    }
}

impl HostIndex for FakeIndex {
    fn file_cache(&self, path: &str) -> Option<FileCache> {
        self.caches.get(path).cloned()
    }

    fn iterate_refs(&self, visit: &mut dyn FnMut(&str, &RawLink)) {
        for (doc, raw) in &self.refs {
            visit(doc, raw);
        }
    }

    fn resolve_link(&self, link_path: &str, _from_doc: &str) -> Option<String> {
        if link_path.is_empty() {
            return None;
        }
        if link_path.ends_with(MARKDOWN_EXTENSION) || link_path.ends_with(CANVAS_EXTENSION) {
            Some(link_path.to_string())
        } else {
            Some(format!("{link_path}{MARKDOWN_EXTENSION}"))
        }
    }

    fn canvases_with(&self, filter: &dyn Fn(&str, &CanvasEmbed) -> bool) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for (path, embed) in &self.embeds {
            if filter(path, embed) && !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}

#[derive(Default)]
pub struct FakeSurface {
    own: Option<String>,
    pub drawn: Vec<DropPayload>,
    pub live_updates: usize,
    pub renames: Vec<RenameSpec>,
}

impl FakeSurface {
    pub fn with_path(path: &str) -> Self {
        Self {
            own: Some(path.to_string()),
            ..Self::default()
        }
    }
}

impl DropSurface for FakeSurface {
    fn own_path(&self) -> Option<String> {
        self.own.clone()
    }

    fn draw(&mut self, payload: DropPayload) -> Result<(), HostError> {
        self.drawn.push(payload);
        Ok(())
    }

    fn update_links(&mut self, rename: &RenameSpec) -> Result<(), HostError> {
        self.live_updates += 1;
        self.renames.push(rename.clone());
        Ok(())
    }
}

pub struct FakeEvents {
    settles: bool,
    subscriptions: Cell<usize>,
}

impl FakeEvents {
    pub fn settled() -> Self {
        Self {
            settles: true,
            subscriptions: Cell::new(0),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            settles: false,
            subscriptions: Cell::new(0),
        }
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.get()
    }
}

struct FakeSubscription {
    settles: bool,
}

impl CacheSubscription for FakeSubscription {
    fn wait(&mut self, _budget: Duration) -> bool {
        self.settles
    }
}

impl MetadataEvents for FakeEvents {
    fn subscribe(&self, _path: &str) -> Box<dyn CacheSubscription> {
        self.subscriptions.set(self.subscriptions.get() + 1);
        Box::new(FakeSubscription {
            settles: self.settles,
        })
    }
}

/// Dialog stand-in answering from a fixed script. Runs out of replies by
/// cancelling, so a stuck loop fails the test instead of hanging it.
pub struct ScriptedPrompt {
    replies: VecDeque<PromptReply>,
    pub requests: Vec<PromptRequest>,
}

impl ScriptedPrompt {
    pub fn new(replies: Vec<PromptReply>) -> Self {
        Self {
            replies: replies.into(),
            requests: Vec::new(),
        }
    }
}

impl NamePrompt for ScriptedPrompt {
    fn request(&mut self, request: &PromptRequest) -> PromptReply {
        self.requests.push(request.clone());
        self.replies.pop_front().unwrap_or(PromptReply::Cancel)
    }
}
