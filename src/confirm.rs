use crate::blocks::{Block, Section};
use crate::markdown::{self, is_valid_block_id};
use crate::naming::{check_file_name, FileInfo};
use tracing::debug;

/// What the confirmation dialog asks the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRequest {
    /// Pre-filled name: the default on the first round, the user's previous
    /// input on every retry.
    pub name: String,
    /// Whether "link to reference" is offered at all.
    pub can_link: bool,
    /// The reference target is a heading (arbitrary names allowed).
    pub link_to_heading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptReply {
    CreateFile(String),
    LinkToReference(String),
    Cut,
    Cancel,
}

/// The host's modal dialog. Blocks until the user acts.
pub trait NamePrompt {
    fn request(&mut self, request: &PromptRequest) -> PromptReply;
}

/// A fully validated outcome of the confirmation loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmedAction {
    CreateFile(FileInfo),
    LinkToReference(String),
    Cut,
}

enum State {
    Prompting { name: String, error: Option<String> },
    Done(ConfirmedAction),
    Cancelled,
}

enum Validation {
    Valid(ConfirmedAction),
    Retry(String),
}

/// Derive the dialog's default name: the block's existing name, then the
/// parsed list-item text, then the first line of the selected content.
pub fn default_name(section: &Section, block_text: Option<&str>, content: &str) -> String {
    if let Section::Reference { block, .. } = section {
        if let Some(name) = block.name() {
            return name.to_string();
        }
        if let (Block::List { .. }, Some(text)) = (block, block_text) {
            if let Some(item) = markdown::parse_list_item(text) {
                return markdown::first_line_name(&item.text, 20);
            }
        }
    }
    markdown::first_line_name(content, 20)
}

/// Run the interactive confirmation loop until the user supplies a valid
/// action or cancels. Cancellation makes the whole gesture a no-op.
pub fn negotiate(
    prompt: &mut dyn NamePrompt,
    section: &Section,
    default: String,
    folder: &str,
    exists: &dyn Fn(&str) -> bool,
) -> Option<ConfirmedAction> {
    let can_link = section.is_reference();
    let link_to_heading = section.block().is_some_and(Block::is_heading);

    let mut state = State::Prompting {
        name: default,
        error: None,
    };
    loop {
        match state {
            State::Prompting { name, error } => {
                let reply = prompt.request(&PromptRequest {
                    name,
                    can_link,
                    link_to_heading,
                    error,
                });
                state = match reply {
                    PromptReply::Cancel => State::Cancelled,
                    PromptReply::Cut => State::Done(ConfirmedAction::Cut),
                    PromptReply::CreateFile(input) => {
                        match validate_create(&input, folder, exists) {
                            Validation::Valid(action) => State::Done(action),
                            Validation::Retry(message) => State::Prompting {
                                name: input,
                                error: Some(message),
                            },
                        }
                    }
                    PromptReply::LinkToReference(input) => {
                        match validate_link(&input, can_link, link_to_heading) {
                            Validation::Valid(action) => State::Done(action),
                            Validation::Retry(message) => State::Prompting {
                                name: input,
                                error: Some(message),
                            },
                        }
                    }
                };
            }
            State::Done(action) => {
                debug!(?action, "confirmation settled");
                return Some(action);
            }
            State::Cancelled => return None,
        }
    }
}

fn validate_create(input: &str, folder: &str, exists: &dyn Fn(&str) -> bool) -> Validation {
    let info = FileInfo::markdown(folder, input.trim_end());
    match check_file_name(info, exists) {
        Ok(info) => Validation::Valid(ConfirmedAction::CreateFile(info)),
        Err(message) => Validation::Retry(message),
    }
}

fn validate_link(input: &str, can_link: bool, link_to_heading: bool) -> Validation {
    if !can_link {
        return Validation::Retry("No referenceable block under this selection".to_string());
    }
    let name = input.trim_end();
    if link_to_heading {
        if name.is_empty() {
            return Validation::Retry("Heading name can not be empty!".to_string());
        }
        return Validation::Valid(ConfirmedAction::LinkToReference(name.to_string()));
    }
    if !is_valid_block_id(name) {
        return Validation::Retry(
            "Block id can only contain letters, numbers and dashes".to_string(),
        );
    }
    Validation::Valid(ConfirmedAction::LinkToReference(name.to_string()))
}
