pub const MARKDOWN_EXTENSION: &str = ".md";
pub const CANVAS_EXTENSION: &str = ".canvas";

const INVALID_FILE_CHARS: &[char] = &[
    '!', '"', '#', '$', '%', '&', '(', ')', '*', '+', ',', '.', ':', ';', '<', '=', '>', '?', '@',
    '^', '`', '{', '|', '}', '~', '/', '[', ']', '\\', '\r', '\n',
];

pub fn invalid_file_char(ch: char) -> bool {
    INVALID_FILE_CHARS.contains(&ch)
}

pub fn file_name_has_invalid_char(name: &str) -> bool {
    name.chars().any(invalid_file_char)
}

/// Block identifiers accept ascii letters, digits and dashes only.
pub fn is_valid_block_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

/// Rewrite a heading so it is usable as a link fragment: characters that
/// break link syntax become spaces, whitespace runs collapse to one space.
pub fn normalize_heading_fragment(heading: &str) -> String {
    let mut replaced = String::with_capacity(heading.len());
    let chars: Vec<char> = heading.chars().collect();
    let mut ix = 0;
    while ix < chars.len() {
        let pair = (chars[ix], chars.get(ix + 1).copied());
        match pair {
            ('%', Some('%')) | ('[', Some('[')) | (']', Some(']')) => {
                replaced.push(' ');
                ix += 2;
            }
            (ch, _) if matches!(ch, ':' | '#' | '|' | '^' | '\\' | '\r' | '\n') => {
                replaced.push(' ');
                ix += 1;
            }
            (ch, _) => {
                replaced.push(ch);
                ix += 1;
            }
        }
    }
    let mut collapsed = String::with_capacity(replaced.len());
    let mut was_space = false;
    for ch in replaced.chars() {
        if ch.is_whitespace() {
            if !was_space {
                collapsed.push(' ');
            }
            was_space = true;
        } else {
            collapsed.push(ch);
            was_space = false;
        }
    }
    collapsed.trim().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingLine {
    pub marker: String,
    pub title: String,
}

pub fn parse_heading(line: &str) -> Option<HeadingLine> {
    let hashes = line.chars().take_while(|ch| *ch == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some(HeadingLine {
        marker: line[..hashes].to_string(),
        title: rest[1..].to_string(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItemLine {
    pub marker: String,
    /// Checkbox text like `[x]`, when the item is a task.
    pub task: Option<String>,
    pub text: String,
}

pub fn parse_list_item(line: &str) -> Option<ListItemLine> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let marker_len = match trimmed.chars().next()? {
        '*' | '+' | '-' => 1,
        ch if ch.is_ascii_digit() => {
            let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
            match trimmed[digits..].chars().next() {
                Some('.') | Some(')') => digits + 1,
                _ => return None,
            }
        }
        _ => return None,
    };
    let marker = trimmed[..marker_len].to_string();
    let rest = &trimmed[marker_len..];
    let body = if rest.is_empty() {
        ""
    } else if rest.starts_with(' ') || rest.starts_with('\t') {
        rest[1..].trim_start_matches([' ', '\t'])
    } else {
        return None;
    };
    let (task, text) = parse_task(body);
    Some(ListItemLine {
        marker,
        task,
        text: text.to_string(),
    })
}

fn parse_task(body: &str) -> (Option<String>, &str) {
    let mut chars = body.chars();
    if chars.next() == Some('[') {
        if let Some(mark) = chars.next() {
            if chars.next() == Some(']') {
                let box_len = '['.len_utf8() + mark.len_utf8() + ']'.len_utf8();
                let rest = &body[box_len..];
                if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
                    return (
                        Some(body[..box_len].to_string()),
                        rest.trim_start_matches([' ', '\t']),
                    );
                }
            }
        }
    }
    (None, body)
}

/// First line of the content, truncated to `limit` characters, trimmed.
pub fn first_line_name(content: &str, limit: usize) -> String {
    let first = content.lines().next().unwrap_or("");
    first.chars().take(limit).collect::<String>().trim().to_string()
}
