use crate::naming;
use crate::propagate::{RenameAction, RenameSpec};
use crate::settings::{ArrowTo, Settings};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The graph-document format: nodes embedding files, text or groups, plus
/// edges between them. Parsed and written back as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub kind: CanvasNodeKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasNodeKind {
    File {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        subpath: Option<String>,
    },
    Text {
        text: String,
    },
    Group {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Link {
        url: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub id: String,
    #[serde(rename = "fromNode")]
    pub from_node: String,
    #[serde(rename = "fromSide")]
    pub from_side: String,
    #[serde(rename = "toNode")]
    pub to_node: String,
    #[serde(rename = "toSide")]
    pub to_side: String,
    #[serde(rename = "fromEnd", skip_serializing_if = "Option::is_none")]
    pub from_end: Option<String>,
    #[serde(rename = "toEnd", skip_serializing_if = "Option::is_none")]
    pub to_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A file embed as reported by the host's canvas index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanvasEmbed {
    pub file: Option<String>,
    pub subpath: Option<String>,
}

pub fn parse(raw: &str) -> Result<CanvasData, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn to_json(data: &CanvasData) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Substitute the `file`/`subpath` properties of every matching file node.
/// Returns the number of nodes changed.
pub fn rewrite_file_nodes(data: &mut CanvasData, spec: &RenameSpec) -> usize {
    let mut changed = 0;
    for node in &mut data.nodes {
        let CanvasNodeKind::File { file, subpath } = &mut node.kind else {
            continue;
        };
        let link = crate::host::LinkPath {
            path: file.clone(),
            subpath: subpath.clone(),
            display: None,
        };
        if !spec.matches(&link, None) {
            continue;
        }
        match &spec.action {
            RenameAction::RetargetFile { new_path } => {
                *file = new_path.clone();
            }
            RenameAction::RenameFragment { new_fragment } => {
                *subpath = Some(new_fragment.clone());
            }
        }
        changed += 1;
    }
    if changed > 0 {
        debug!(nodes = changed, "rewrote canvas file nodes");
    }
    changed
}

/// Rename just the fragment of embeds pointing at `file`, leaving the file
/// itself in place. Used when a block keeps its file but changes identity.
pub fn rename_subpath(data: &mut CanvasData, file: &str, old: &str, new: &str) -> usize {
    let mut changed = 0;
    for node in &mut data.nodes {
        if let CanvasNodeKind::File { file: node_file, subpath } = &mut node.kind {
            if node_file == file && subpath.as_deref() == Some(old) {
                *subpath = Some(new.to_string());
                changed += 1;
            }
        }
    }
    changed
}

/// Plan the edge the auto-link option wires between the source note's node
/// and the freshly dropped node. Arrow placement follows `arrow_to`.
pub fn auto_link_edge(
    settings: &Settings,
    source_node: &str,
    new_node: &str,
) -> Option<CanvasEdge> {
    if !settings.auto_link {
        return None;
    }
    let (from_end, to_end) = match settings.arrow_to {
        ArrowTo::From => (Some("arrow".to_string()), Some("none".to_string())),
        ArrowTo::End => (None, None),
        ArrowTo::Both => (Some("arrow".to_string()), None),
        ArrowTo::None => (None, Some("none".to_string())),
    };
    Some(CanvasEdge {
        id: naming::mint_block_id(),
        from_node: source_node.to_string(),
        from_side: "right".to_string(),
        to_node: new_node.to_string(),
        to_side: "left".to_string(),
        from_end,
        to_end,
        label: settings.default_link_label.clone(),
    })
}
