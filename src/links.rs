use crate::host::{LinkPath, RenderedLink};
use crate::markdown::MARKDOWN_EXTENSION;
use crate::settings::LinkStyle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WikiLink {
    pub embed: bool,
    pub target: String,
    pub display: Option<String>,
}

pub fn parse_wikilink(raw: &str) -> Option<WikiLink> {
    let (embed, rest) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let inner = rest.strip_prefix("[[")?.strip_suffix("]]")?;
    let (target, display) = match inner.split_once('|') {
        Some((target, display)) => (target, Some(display.to_string())),
        None => (inner, None),
    };
    Some(WikiLink {
        embed,
        target: target.to_string(),
        display,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownLink {
    pub embed: bool,
    pub display: String,
    pub target: String,
    /// Anything after the target inside the parentheses, e.g. a title.
    pub trailing: Option<String>,
}

pub fn parse_markdown_link(raw: &str) -> Option<MarkdownLink> {
    let (embed, rest) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let inner = rest.strip_prefix('[')?.strip_suffix(')')?;
    let (display, body) = inner.split_once("](")?;
    let body = body.trim_start();
    let (target, trailing) = match body.split_once(char::is_whitespace) {
        Some((target, trailing)) => (target, Some(trailing.trim().to_string())),
        None => (body, None),
    };
    if target.is_empty() {
        return None;
    }
    Some(MarkdownLink {
        embed,
        display: display.to_string(),
        target: target.to_string(),
        trailing: trailing.filter(|t| !t.is_empty()),
    })
}

/// Split a raw link target into its path and `#...` fragment, stripping the
/// non-breaking spaces the host editor sometimes inserts and undoing the
/// percent-encoding markdown-style targets carry.
pub fn split_target(target: &str) -> (String, Option<String>) {
    let cleaned: String = target.chars().filter(|ch| *ch != '\u{00A0}').collect();
    let decoded = percent_decode(&cleaned);
    match decoded.find('#') {
        Some(ix) => (decoded[..ix].to_string(), Some(decoded[ix..].to_string())),
        None => (decoded, None),
    }
}

/// Undo `%XX` escapes; malformed escapes stay as written.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut ix = 0;
    while ix < bytes.len() {
        if bytes[ix] == b'%' && ix + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[ix + 1]), hex_val(bytes[ix + 2])) {
                out.push(hi * 16 + lo);
                ix += 3;
                continue;
            }
        }
        out.push(bytes[ix]);
        ix += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| raw.to_string())
}

fn hex_val(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Link-path form of a stored file path: markdown notes drop the extension.
pub fn link_path_for(file_path: &str) -> String {
    file_path
        .strip_suffix(MARKDOWN_EXTENSION)
        .unwrap_or(file_path)
        .to_string()
}

pub fn render_link(full_target: &str, display: Option<&str>, style: LinkStyle) -> String {
    match style {
        LinkStyle::Wiki => match display {
            Some(display) => format!("[[{full_target}|{display}]]"),
            None => format!("[[{full_target}]]"),
        },
        LinkStyle::Markdown => {
            let display = display.unwrap_or(full_target);
            let escaped = full_target.replace(' ', "%20");
            format!("[{display}]({escaped})")
        }
    }
}

/// Render the canonical reference for a stored note, respecting the
/// configured link style.
pub fn create_link_text(
    file_path: &str,
    subpath: Option<&str>,
    display: Option<&str>,
    style: LinkStyle,
) -> RenderedLink {
    let link = LinkPath {
        path: link_path_for(file_path),
        subpath: subpath.map(str::to_string),
        display: display.map(str::to_string),
    };
    let text = render_link(&link.full_target(), display, style);
    RenderedLink { link, text }
}

/// Rewrite an existing link occurrence to point at a new target while
/// preserving its style, embed marker and display text.
pub fn rewrite_link_text(original: &str, new_target: &str) -> String {
    if let Some(wiki) = parse_wikilink(original) {
        let embed = if wiki.embed { "!" } else { "" };
        return match wiki.display {
            Some(display) => format!("{embed}[[{new_target}|{display}]]"),
            None => format!("{embed}[[{new_target}]]"),
        };
    }
    if let Some(md) = parse_markdown_link(original) {
        let embed = if md.embed { "!" } else { "" };
        let escaped = new_target.replace(' ', "%20");
        return match md.trailing {
            Some(trailing) => format!("{embed}[{}]({escaped} {trailing})", md.display),
            None => format!("{embed}[{}]({escaped})", md.display),
        };
    }
    format!("[[{new_target}]]")
}
