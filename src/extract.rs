//! The three drop actions: extract the selection into a new note, link the
//! drop to the block it already lives in, or cut it out as plain text.

use crate::blocks::{self, Block, FileCache};
use crate::host::{
    DropPayload, DropSurface, EditorBuffer, HostError, HostIndex, MetadataEvents, NoteStore,
    TextEdit,
};
use crate::links;
use crate::markdown;
use crate::naming::FileInfo;
use crate::propagate::{apply_plan, build_plan, RenameAction, RenameSpec};
use crate::selection::{Selection, SourceContext, UserSelection};
use crate::settings::Settings;
use std::collections::BTreeSet;
use tracing::debug;

/// Extract the selection into a freshly created note and replace it with a
/// link to that note. Named blocks and headings the selection carries along
/// get their existing references retargeted at the new file.
#[allow(clippy::too_many_arguments)]
pub fn create_file(
    editor: &mut dyn EditorBuffer,
    store: &mut dyn NoteStore,
    index: &dyn HostIndex,
    events: &dyn MetadataEvents,
    surface: &mut dyn DropSurface,
    settings: &Settings,
    source: &SourceContext,
    selection: &UserSelection,
    info: &FileInfo,
) -> Result<DropPayload, HostError> {
    let full_path = info.full_path();
    store.create_note(&full_path, selection.content())?;
    let rendered = links::create_link_text(&full_path, None, None, settings.link_style);

    // The plan is built against the pre-edit cache; the buffer edit below
    // invalidates the source file's spans but not the referrers'.
    let spans = selection.edit_spans(source.text_offset);
    let mut planned = None;
    if let Some(file) = &source.file {
        if let Some(cache) = index.file_cache(file) {
            let fragments = carried_fragments(&cache, &spans, source.text_offset);
            if !fragments.is_empty() {
                let spec = RenameSpec {
                    target: file.clone(),
                    fragments,
                    action: RenameAction::RetargetFile {
                        new_path: full_path.clone(),
                    },
                };
                let plan = build_plan(index, file, &spec);
                debug!(
                    file = %full_path,
                    referrers = plan.text.len(),
                    canvases = plan.canvases.len(),
                    "extraction moves addressable blocks"
                );
                planned = Some((spec, plan));
            }
        }
    }

    editor.apply(&replacement_edits(&spans, &rendered.text))?;

    if let Some((spec, plan)) = planned {
        apply_plan(plan, &spec, surface, store, events, settings, Some(&full_path))?;
    }
    Ok(DropPayload::Link(rendered))
}

/// Fragments whose referenced block travels with the extracted spans. The
/// spans are buffer-local; the cache speaks host-file offsets.
fn carried_fragments(cache: &FileCache, spans: &[Selection], offset: usize) -> BTreeSet<String> {
    let mut fragments = BTreeSet::new();
    for span in spans {
        let (named, headings) =
            blocks::find_link_blocks(cache, span.from + offset, span.to + offset);
        for (id, _) in named {
            fragments.insert(format!("#^{id}"));
        }
        for heading in headings {
            fragments.insert(format!(
                "#{}",
                markdown::normalize_heading_fragment(&heading.heading)
            ));
        }
    }
    fragments
}

fn replacement_edits(spans: &[Selection], link: &str) -> Vec<TextEdit> {
    spans
        .iter()
        .map(|span| TextEdit {
            from: span.from,
            to: span.to,
            insert: link.to_string(),
        })
        .collect()
}

/// Keep the content in place and link the drop to its block, naming or
/// renaming the block as needed. A rename walks every referring document.
#[allow(clippy::too_many_arguments)]
pub fn link_to_reference(
    editor: &mut dyn EditorBuffer,
    store: &mut dyn NoteStore,
    index: &dyn HostIndex,
    events: &dyn MetadataEvents,
    surface: &mut dyn DropSurface,
    settings: &Settings,
    source: &SourceContext,
    file: &str,
    block: &Block,
    name: &str,
) -> Result<DropPayload, HostError> {
    let offset = source.text_offset;
    let span = block.span();
    let mut edits = Vec::new();
    let mut rename = None;

    let subpath = match block {
        Block::Heading { name: old, level, .. } => {
            let new_fragment = format!("#{}", markdown::normalize_heading_fragment(name));
            if old != name {
                // Keep the marker as written; fall back to the cached level
                // if the line is not where the cache says it is.
                let line = editor.line_at(span.start.saturating_sub(offset));
                let marker = markdown::parse_heading(&line.text)
                    .map(|heading| heading.marker)
                    .unwrap_or_else(|| "#".repeat(usize::from(*level)));
                edits.push(TextEdit {
                    from: line.from,
                    to: line.to,
                    insert: format!("{marker} {name}"),
                });
                rename = Some((
                    format!("#{}", markdown::normalize_heading_fragment(old)),
                    new_fragment.clone(),
                ));
            }
            new_fragment
        }
        Block::LinkBlock { id, .. } | Block::List { id: Some(id), .. } => {
            let new_fragment = format!("#^{name}");
            if id != name {
                // The block ends with its ` ^id` trailer; swap the id part.
                let end = span.end.saturating_sub(offset);
                edits.push(TextEdit {
                    from: end.saturating_sub(id.len() + 1),
                    to: end,
                    insert: format!("^{name}"),
                });
                rename = Some((format!("#^{id}"), new_fragment.clone()));
            }
            new_fragment
        }
        Block::List { id: None, .. } | Block::Plain { .. } => {
            let end = span.end.saturating_sub(offset);
            edits.push(TextEdit {
                from: end,
                to: end,
                insert: format!(" ^{name}"),
            });
            format!("#^{name}")
        }
    };

    let planned = match rename {
        Some((old_fragment, new_fragment)) => {
            let spec = RenameSpec {
                target: file.to_string(),
                fragments: BTreeSet::from([old_fragment]),
                action: RenameAction::RenameFragment {
                    new_fragment,
                },
            };
            let plan = build_plan(index, file, &spec);
            Some((spec, plan))
        }
        None => None,
    };

    editor.apply(&edits)?;

    if let Some((spec, plan)) = planned {
        if !plan.is_empty() {
            debug!(file, fragment = %subpath, "propagating block rename");
        }
        apply_plan(plan, &spec, surface, store, events, settings, None)?;
    }

    let rendered = links::create_link_text(file, Some(&subpath), None, settings.link_style);
    Ok(DropPayload::Link(rendered))
}

/// Remove the selection from the buffer and hand it over as plain text.
/// Creates no file and rewrites no links.
pub fn cut(
    editor: &mut dyn EditorBuffer,
    source: &SourceContext,
    selection: &UserSelection,
) -> Result<DropPayload, HostError> {
    let edits: Vec<TextEdit> = selection
        .edit_spans(source.text_offset)
        .iter()
        .map(|span| TextEdit {
            from: span.from,
            to: span.to,
            insert: String::new(),
        })
        .collect();
    editor.apply(&edits)?;
    Ok(DropPayload::Text(selection.content().to_string()))
}
