//! Drag-to-extract engine for markdown vaults: pull a line, a folded block
//! or a selection out of a note onto a graph surface, leave a link behind
//! and keep every document in the vault pointing at the right place.

pub mod blocks;
pub mod canvas;
pub mod confirm;
pub mod extract;
pub mod gesture;
pub mod host;
pub mod links;
pub mod markdown;
pub mod naming;
pub mod propagate;
pub mod selection;
pub mod settings;

#[cfg(test)]
pub(crate) mod testutil;
