use crate::canvas;
use crate::host::{
    DropSurface, HostError, HostIndex, LinkPath, LinkRewrite, MetadataEvents, NoteStore,
};
use crate::links;
use crate::markdown::MARKDOWN_EXTENSION;
use crate::settings::Settings;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, warn};

/// What happened to the referenced block's identity: the block moved into a
/// new file, or it kept its file and changed fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenameAction {
    RetargetFile { new_path: String },
    RenameFragment { new_fragment: String },
}

/// The shared match predicate and new-path mapping for one propagation
/// pass, written once and consumed by both the text and the graph applier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameSpec {
    /// Full stored path of the file the old references resolve into.
    pub target: String,
    /// Matched fragments; every entry starts with `#`.
    pub fragments: BTreeSet<String>,
    pub action: RenameAction,
}

impl RenameSpec {
    pub fn matches(&self, link: &LinkPath, resolved: Option<&str>) -> bool {
        let path_hit = resolved.map_or_else(|| self.matches_path(&link.path), |p| p == self.target);
        let fragment_hit = link
            .subpath
            .as_deref()
            .is_some_and(|sub| self.fragments.contains(sub));
        path_hit && fragment_hit
    }

    fn matches_path(&self, path: &str) -> bool {
        path == self.target
            || Some(path) == self.target.strip_suffix(MARKDOWN_EXTENSION)
    }

    pub fn map(&self, old: &LinkPath) -> LinkPath {
        match &self.action {
            RenameAction::RetargetFile { new_path } => LinkPath {
                path: links::link_path_for(new_path),
                subpath: old.subpath.clone(),
                display: old.display.clone(),
            },
            RenameAction::RenameFragment { new_fragment } => LinkPath {
                path: old.path.clone(),
                subpath: Some(new_fragment.clone()),
                display: old.display.clone(),
            },
        }
    }
}

/// All rewrites one identity change requires, computed once from the host
/// index and consumed exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewritePlan {
    /// Referring document path -> link rewrites. Never contains the source
    /// document; its references are handled by the in-buffer edit.
    pub text: BTreeMap<String, Vec<LinkRewrite>>,
    /// Graph documents with at least one matching embed.
    pub canvases: Vec<String>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.canvases.is_empty()
    }
}

pub fn build_plan(index: &dyn HostIndex, source_path: &str, spec: &RenameSpec) -> RewritePlan {
    let mut text: BTreeMap<String, Vec<LinkRewrite>> = BTreeMap::new();
    index.iterate_refs(&mut |doc, raw| {
        if doc == source_path {
            // Self-references are rewritten by the in-buffer edit.
            return;
        }
        let (path, subpath) = links::split_target(&raw.target);
        let link = LinkPath {
            path,
            subpath,
            display: None,
        };
        let resolved = index.resolve_link(&link.path, doc);
        if !spec.matches(&link, resolved.as_deref()) {
            return;
        }
        let new_target = spec.map(&link).full_target();
        text.entry(doc.to_string()).or_default().push(LinkRewrite {
            span: raw.span,
            new_text: links::rewrite_link_text(&raw.original, &new_target),
        });
    });

    let canvases = index.canvases_with(&|_, embed| {
        let link = LinkPath {
            path: embed.file.clone().unwrap_or_default(),
            subpath: embed.subpath.clone(),
            display: None,
        };
        spec.matches(&link, None)
    });

    RewritePlan { text, canvases }
}

/// Apply a rewrite plan. The open drop surface repairs its own references
/// through its live-mutation API and is removed from the generic sets so
/// the two update paths never both fire. Rewrites inside `new_file` wait
/// for that file's metadata-cache entry, bounded by the configured budget;
/// on timeout they are skipped and never retried.
pub fn apply_plan(
    mut plan: RewritePlan,
    spec: &RenameSpec,
    surface: &mut dyn DropSurface,
    store: &mut dyn NoteStore,
    events: &dyn MetadataEvents,
    settings: &Settings,
    new_file: Option<&str>,
) -> Result<(), HostError> {
    if let Some(own) = surface.own_path() {
        let in_text = plan.text.remove(&own).is_some();
        let in_canvas = plan.canvases.iter().any(|path| path == &own);
        if in_canvas {
            plan.canvases.retain(|path| path != &own);
        }
        if in_text || in_canvas {
            debug!(surface = %own, "updating drop surface references in place");
            surface.update_links(spec)?;
        }
    }

    let mut changes: BTreeMap<String, Vec<LinkRewrite>> = BTreeMap::new();
    for (doc, rewrites) in plan.text {
        if Some(doc.as_str()) == new_file {
            let budget = Duration::from_millis(settings.propagation_wait_ms);
            let mut subscription = events.subscribe(&doc);
            if !subscription.wait(budget) {
                if settings.warn_on_timeout {
                    warn!(
                        file = %doc,
                        "metadata cache never settled; leaving its links unrewritten"
                    );
                }
                continue;
            }
        }
        changes.insert(doc, rewrites);
    }
    if !changes.is_empty() {
        store.apply_link_changes(&changes)?;
    }

    for path in plan.canvases {
        let raw = store.read_document(&path)?;
        let mut data = canvas::parse(&raw)?;
        let changed = canvas::rewrite_file_nodes(&mut data, spec);
        if changed > 0 {
            store.write_document(&path, &canvas::to_json(&data)?)?;
        }
    }

    Ok(())
}
