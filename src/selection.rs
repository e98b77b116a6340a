use crate::blocks::{self, FileCache, Section, Span};
use crate::host::EditorBuffer;

/// Half-open offset range into the current buffer, in buffer-local
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineRange {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

/// Where the active editor lives. When the editor is a text fragment hosted
/// inside a graph node, `text_offset` is the cumulative character offset of
/// the embed's visible slice within its host file; adding it maps
/// buffer-local offsets to the offsets used by the host's structural cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceContext {
    pub file: Option<String>,
    pub text_offset: usize,
}

impl SourceContext {
    pub fn plain(file: &str) -> Self {
        Self {
            file: Some(file.to_string()),
            text_offset: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserSelection {
    /// One line that starts a foldable region; the selection covers the
    /// whole folded range.
    Foldable {
        line: LineRange,
        selection: Selection,
        content: String,
    },
    /// A single line with no explicit selection.
    Line {
        line: LineRange,
        selection: Selection,
        section: Section,
        content: String,
    },
    Single {
        selection: Selection,
        content: String,
    },
    Multiple {
        selections: Vec<Selection>,
        content: String,
    },
}

impl UserSelection {
    pub fn content(&self) -> &str {
        match self {
            UserSelection::Foldable { content, .. }
            | UserSelection::Line { content, .. }
            | UserSelection::Single { content, .. }
            | UserSelection::Multiple { content, .. } => content,
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, UserSelection::Multiple { .. })
    }

    /// The span(s) a buffer edit should replace, in buffer-local
    /// coordinates. A line that resolved to a reference covers the whole
    /// block, not just the line; a block starting before the embed's
    /// visible slice clamps to the buffer start.
    pub fn edit_spans(&self, text_offset: usize) -> Vec<Selection> {
        match self {
            UserSelection::Line {
                section: Section::Reference { block, .. },
                ..
            } => {
                let span = block.span();
                vec![Selection::new(
                    span.start.saturating_sub(text_offset),
                    span.end.saturating_sub(text_offset),
                )]
            }
            UserSelection::Foldable { selection, .. }
            | UserSelection::Line { selection, .. }
            | UserSelection::Single { selection, .. } => vec![*selection],
            UserSelection::Multiple { selections, .. } => selections.clone(),
        }
    }

    /// The span used for block resolution, in host-file coordinates.
    /// Multi-range selections never resolve to a block.
    pub fn resolve_span(&self, text_offset: usize) -> Option<Span> {
        match self {
            UserSelection::Multiple { .. } => None,
            UserSelection::Foldable { selection, .. }
            | UserSelection::Line { selection, .. }
            | UserSelection::Single { selection, .. } => Some(Span::new(
                selection.from + text_offset,
                selection.to + text_offset,
            )),
        }
    }
}

/// Build a `UserSelection` from the current editor state. Explicit selection
/// ranges win; an empty selection falls back to the line under the gutter
/// anchor.
pub fn extract(
    editor: &dyn EditorBuffer,
    anchor: usize,
    source: &SourceContext,
    cache: Option<&FileCache>,
) -> UserSelection {
    let ranges = editor.selection_ranges();
    let content = ranges
        .iter()
        .map(|range| editor.slice(range.from, range.to))
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string();

    if !content.is_empty() {
        if ranges.len() == 1 {
            return UserSelection::Single {
                selection: ranges[0],
                content,
            };
        }
        return UserSelection::Multiple {
            selections: ranges,
            content,
        };
    }

    let line = editor.line_at(anchor);
    if let Some(fold_end) = editor.foldable_end(line.from) {
        let selection = Selection::new(line.from, fold_end);
        let content = editor.slice(selection.from, selection.to);
        return UserSelection::Foldable {
            line,
            selection,
            content,
        };
    }

    let selection = Selection::new(line.from, line.to);
    let section = match (&source.file, cache) {
        (Some(file), Some(cache)) => blocks::resolve(
            file,
            cache,
            Span::new(
                selection.from + source.text_offset,
                selection.to + source.text_offset,
            ),
        ),
        _ => Section::Unreference,
    };
    let content = match &section {
        Section::Reference { block, .. } => {
            let span = block.span();
            let from = span.start.saturating_sub(source.text_offset);
            let to = span.end.saturating_sub(source.text_offset).min(editor.len());
            editor.slice(from, to.max(from))
        }
        Section::Unreference => line.text.clone(),
    };
    UserSelection::Line {
        line,
        selection,
        section,
        content,
    }
}

/// Lifecycle of one drag gesture. Dragging an element that sits inside a
/// table fires a spurious drag-end immediately after drag-start, so the
/// drop wiring is armed one tick later and an end event arriving before
/// that tick is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Starting,
    Armed,
    Dropped,
    Ended,
}

#[derive(Debug)]
pub struct DragSession {
    phase: DragPhase,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn drag_start(&mut self) {
        self.phase = DragPhase::Starting;
    }

    /// Scheduled on the next turn after drag-start; arms the drop handler.
    pub fn tick(&mut self) {
        if self.phase == DragPhase::Starting {
            self.phase = DragPhase::Armed;
        }
    }

    /// Returns true when the drop should be handled.
    pub fn accept_drop(&mut self) -> bool {
        if self.phase == DragPhase::Armed {
            self.phase = DragPhase::Dropped;
            true
        } else {
            false
        }
    }

    /// Returns true when cleanup should run. A drag-end arriving before the
    /// arming tick is the spurious end-of-drag event and is ignored.
    pub fn drag_end(&mut self) -> bool {
        match self.phase {
            DragPhase::Starting => false,
            DragPhase::Armed | DragPhase::Dropped => {
                self.phase = DragPhase::Ended;
                true
            }
            DragPhase::Idle | DragPhase::Ended => false,
        }
    }
}
