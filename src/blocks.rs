use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    #[default]
    Paragraph,
    Heading,
    List,
    Code,
    Quote,
    Table,
    Html,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionEntry {
    pub kind: SectionKind,
    pub span: Span,
    /// Persistent `^id` identifier, when the section already carries one.
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingEntry {
    pub heading: String,
    pub level: u8,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItemEntry {
    pub span: Span,
    pub id: Option<String>,
}

/// Structural cache for one document, mirroring what the host's metadata
/// cache reports: top-level sections, headings, individual list items and
/// the map of named blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileCache {
    pub sections: Vec<SectionEntry>,
    pub headings: Vec<HeadingEntry>,
    pub list_items: Vec<ListItemEntry>,
    pub blocks: BTreeMap<String, Span>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading {
        name: String,
        level: u8,
        span: Span,
    },
    List {
        id: Option<String>,
        span: Span,
    },
    LinkBlock {
        id: String,
        span: Span,
    },
    Plain {
        kind: SectionKind,
        span: Span,
    },
}

impl Block {
    pub fn span(&self) -> Span {
        match self {
            Block::Heading { span, .. }
            | Block::List { span, .. }
            | Block::LinkBlock { span, .. }
            | Block::Plain { span, .. } => *span,
        }
    }

    /// The block's existing name, if it already has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Block::Heading { name, .. } => Some(name),
            Block::List { id, .. } => id.as_deref(),
            Block::LinkBlock { id, .. } => Some(id),
            Block::Plain { .. } => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
    Unreference,
    Reference { file: String, block: Block },
}

impl Section {
    pub fn is_reference(&self) -> bool {
        matches!(self, Section::Reference { .. })
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Section::Reference { block, .. } => Some(block),
            Section::Unreference => None,
        }
    }
}

/// Map a selection span (host-file offsets) to the semantic block it
/// references. Priority: list item, then heading, then generic section.
/// Absence of a match is the normal `Unreference` outcome, never an error.
pub fn resolve(file: &str, cache: &FileCache, selection: Span) -> Section {
    let start = selection.start;
    // Only top-level lists appear in the section cache, so a list matches by
    // containment wherever it sits in the cache; everything else matches its
    // start offset exactly.
    let section = cache
        .sections
        .iter()
        .find(|section| section.kind == SectionKind::List && section.span.contains(start))
        .or_else(|| {
            cache
                .sections
                .iter()
                .find(|section| section.span.start == start)
        });
    let Some(section) = section else {
        return Section::Unreference;
    };

    let block = match section.kind {
        SectionKind::List => resolve_list_item(cache, start),
        SectionKind::Heading => cache
            .headings
            .iter()
            .find(|heading| heading.span.start == start)
            .map(|heading| Block::Heading {
                name: heading.heading.clone(),
                level: heading.level,
                span: heading.span,
            }),
        _ => None,
    }
    .unwrap_or_else(|| generic_block(section));

    Section::Reference {
        file: file.to_string(),
        block,
    }
}

fn resolve_list_item(cache: &FileCache, start: usize) -> Option<Block> {
    // Innermost item containing the selection start, so selecting anywhere
    // on an item's line, including continuation lines, matches that item.
    cache
        .list_items
        .iter()
        .filter(|item| item.span.contains(start))
        .max_by_key(|item| item.span.start)
        .map(|item| Block::List {
            id: item.id.clone(),
            span: item.span,
        })
}

fn generic_block(section: &SectionEntry) -> Block {
    match &section.id {
        Some(id) => Block::LinkBlock {
            id: id.clone(),
            span: section.span,
        },
        None => Block::Plain {
            kind: section.kind,
            span: section.span,
        },
    }
}

/// Named blocks and headings whose end offset falls inside `(from, to]`,
/// meaning the fragment travels with a range extraction.
pub fn find_link_blocks(
    cache: &FileCache,
    from: usize,
    to: usize,
) -> (Vec<(String, Span)>, Vec<HeadingEntry>) {
    let in_range = |span: Span| span.end > from && span.end <= to;
    let blocks = cache
        .blocks
        .iter()
        .filter(|(_, span)| in_range(**span))
        .map(|(id, span)| (id.clone(), *span))
        .collect();
    let headings = cache
        .headings
        .iter()
        .filter(|heading| in_range(heading.span))
        .cloned()
        .collect();
    (blocks, headings)
}

#[cfg(test)]
mod tests {
    use super::{
        find_link_blocks, resolve, Block, FileCache, HeadingEntry, ListItemEntry, Section,
        SectionEntry, SectionKind, Span,
    };
    use std::collections::BTreeMap;

    fn cache_with_list_and_heading() -> FileCache {
        // 0..20 heading, 21..60 top-level list with two items.
        FileCache {
            sections: vec![
                SectionEntry {
                    kind: SectionKind::Heading,
                    span: Span::new(0, 20),
                    id: None,
                },
                SectionEntry {
                    kind: SectionKind::List,
                    span: Span::new(21, 60),
                    id: None,
                },
            ],
            headings: vec![HeadingEntry {
                heading: "Tasks".to_string(),
                level: 1,
                span: Span::new(0, 20),
            }],
            list_items: vec![
                ListItemEntry {
                    span: Span::new(21, 40),
                    id: Some("task-1".to_string()),
                },
                ListItemEntry {
                    span: Span::new(41, 60),
                    id: None,
                },
            ],
            blocks: BTreeMap::new(),
        }
    }

    #[test]
    fn heading_resolves_on_exact_start_offset() {
        let cache = cache_with_list_and_heading();
        let section = resolve("Doc.md", &cache, Span::new(0, 20));
        match section {
            Section::Reference { block, file } => {
                assert_eq!(file, "Doc.md");
                assert_eq!(
                    block,
                    Block::Heading {
                        name: "Tasks".to_string(),
                        level: 1,
                        span: Span::new(0, 20)
                    }
                );
            }
            Section::Unreference => panic!("expected reference"),
        }
    }

    #[test]
    fn heading_does_not_resolve_on_inner_offset() {
        let cache = cache_with_list_and_heading();
        assert_eq!(resolve("Doc.md", &cache, Span::new(3, 20)), Section::Unreference);
    }

    #[test]
    fn list_item_resolves_anywhere_inside_its_span() {
        let cache = cache_with_list_and_heading();
        for start in [21, 30, 40] {
            let section = resolve("Doc.md", &cache, Span::new(start, 40));
            assert_eq!(
                section.block(),
                Some(&Block::List {
                    id: Some("task-1".to_string()),
                    span: Span::new(21, 40)
                }),
                "start offset {start}"
            );
        }
    }

    #[test]
    fn list_wins_over_heading_at_shared_offset() {
        // A heading start that also falls inside a top-level list region:
        // the list wins even when the cache lists the heading section first.
        let mut cache = cache_with_list_and_heading();
        cache.sections.push(SectionEntry {
            kind: SectionKind::List,
            span: Span::new(0, 20),
            id: None,
        });
        cache.list_items.push(ListItemEntry {
            span: Span::new(0, 20),
            id: None,
        });
        let section = resolve("Doc.md", &cache, Span::new(0, 20));
        assert_eq!(
            section.block(),
            Some(&Block::List {
                id: None,
                span: Span::new(0, 20)
            })
        );
    }

    #[test]
    fn section_with_id_classifies_as_link_block() {
        let cache = FileCache {
            sections: vec![SectionEntry {
                kind: SectionKind::Paragraph,
                span: Span::new(0, 10),
                id: Some("b1".to_string()),
            }],
            ..FileCache::default()
        };
        let section = resolve("Doc.md", &cache, Span::new(0, 10));
        assert_eq!(
            section.block(),
            Some(&Block::LinkBlock {
                id: "b1".to_string(),
                span: Span::new(0, 10)
            })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let cache = cache_with_list_and_heading();
        let first = resolve("Doc.md", &cache, Span::new(30, 40));
        let second = resolve("Doc.md", &cache, Span::new(30, 40));
        assert_eq!(first, second);
    }

    #[test]
    fn find_link_blocks_uses_end_offsets() {
        let mut cache = cache_with_list_and_heading();
        cache.blocks.insert("b1".to_string(), Span::new(25, 40));
        let (blocks, headings) = find_link_blocks(&cache, 21, 60);
        assert_eq!(blocks, vec![("b1".to_string(), Span::new(25, 40))]);
        assert!(headings.is_empty());

        let (blocks, headings) = find_link_blocks(&cache, 0, 20);
        assert!(blocks.is_empty());
        assert_eq!(headings.len(), 1);
    }
}
