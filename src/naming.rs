use crate::markdown::{file_name_has_invalid_char, MARKDOWN_EXTENSION};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub folder: String,
    pub name: String,
    pub extension: String,
}

impl FileInfo {
    pub fn markdown(folder: &str, name: &str) -> Self {
        Self {
            folder: folder.to_string(),
            name: name.to_string(),
            extension: MARKDOWN_EXTENSION.to_string(),
        }
    }

    pub fn full_path(&self) -> String {
        let file_name = format!("{}{}", self.name, self.extension);
        if self.folder.is_empty() {
            file_name
        } else {
            normalize_path(&format!("{}/{}", self.folder, file_name))
        }
    }
}

pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut was_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if !was_slash {
                normalized.push('/');
            }
            was_slash = true;
        } else {
            normalized.push(ch);
            was_slash = false;
        }
    }
    normalized.trim_matches('/').to_string()
}

/// Validate a candidate note name against file-system constraints and
/// uniqueness. The error string is shown verbatim in the re-opened dialog.
pub fn check_file_name(
    info: FileInfo,
    exists: &dyn Fn(&str) -> bool,
) -> Result<FileInfo, String> {
    if info.name.is_empty() {
        return Err("File name can not be empty!".to_string());
    }
    if info.name.ends_with(char::is_whitespace) {
        return Err("File name can not end with white space!".to_string());
    }
    if file_name_has_invalid_char(&info.name) {
        return Err(
            "File name can not contain symbols [!\"#$%&()*+,.:;<=>?@^`{|}~/[]\\]".to_string(),
        );
    }
    if exists(&info.full_path()) {
        return Err("File exists!".to_string());
    }
    Ok(info)
}

/// Default note name when the user never typed one: `NewNote0`, `NewNote1`,
/// ... until a free path is found.
pub fn default_note_name(folder: &str, exists: &dyn Fn(&str) -> bool) -> FileInfo {
    let mut count = 0usize;
    loop {
        let info = FileInfo::markdown(folder, &format!("NewNote{count}"));
        if check_file_name(info.clone(), exists).is_ok() {
            return info;
        }
        count += 1;
    }
}

/// Mint a short random block identifier.
pub fn mint_block_id() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}
