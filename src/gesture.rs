//! Orchestration of one drop gesture, from the raw editor state to the
//! payload drawn on the target surface.

use crate::blocks::{self, Section};
use crate::confirm::{self, ConfirmedAction, NamePrompt};
use crate::extract;
use crate::host::{DropSurface, EditorBuffer, HostError, HostIndex, MetadataEvents, NoteStore};
use crate::selection::{self, SourceContext, UserSelection};
use crate::settings::Settings;
use tracing::debug;

/// Everything the host wires in for the duration of one gesture.
pub struct GestureHost<'a> {
    pub editor: &'a mut dyn EditorBuffer,
    pub store: &'a mut dyn NoteStore,
    pub index: &'a dyn HostIndex,
    pub events: &'a dyn MetadataEvents,
    pub prompt: &'a mut dyn NamePrompt,
    pub settings: &'a Settings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    Completed,
    Cancelled,
}

/// Handle a drop: classify the selection, resolve its block, confirm the
/// action with the user, execute it and draw the result. Cancellation at
/// the dialog leaves the vault untouched.
pub fn run_drop(
    host: GestureHost<'_>,
    surface: &mut dyn DropSurface,
    source: &SourceContext,
    anchor: usize,
) -> Result<GestureOutcome, HostError> {
    let GestureHost {
        editor,
        store,
        index,
        events,
        prompt,
        settings,
    } = host;

    let cache = source.file.as_deref().and_then(|file| index.file_cache(file));
    let sel = selection::extract(&*editor, anchor, source, cache.as_ref());
    debug!(file = ?source.file, multiple = sel.is_multiple(), "classified drop selection");

    let section = match &sel {
        UserSelection::Line { section, .. } => section.clone(),
        UserSelection::Multiple { .. } => Section::Unreference,
        _ => match (&source.file, &cache, sel.resolve_span(source.text_offset)) {
            (Some(file), Some(cache), Some(span)) => blocks::resolve(file, cache, span),
            _ => Section::Unreference,
        },
    };

    let block_text = match &sel {
        UserSelection::Line { line, .. } => Some(line.text.as_str()),
        _ => None,
    };
    let default = confirm::default_name(&section, block_text, sel.content());
    let exists = |path: &str| store.exists(path);
    let Some(action) = confirm::negotiate(
        prompt,
        &section,
        default,
        &settings.default_folder,
        &exists,
    ) else {
        return Ok(GestureOutcome::Cancelled);
    };

    let payload = match action {
        ConfirmedAction::Cut => extract::cut(editor, source, &sel)?,
        ConfirmedAction::CreateFile(info) => extract::create_file(
            editor, store, index, events, surface, settings, source, &sel, &info,
        )?,
        ConfirmedAction::LinkToReference(name) => {
            let Section::Reference { file, block } = &section else {
                return Err(HostError::Edit(
                    "link action without a referenceable block".to_string(),
                ));
            };
            extract::link_to_reference(
                editor, store, index, events, surface, settings, source, file, block, &name,
            )?
        }
    };

    surface.draw(payload)?;
    Ok(GestureOutcome::Completed)
}
