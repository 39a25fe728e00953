//! Headless rich-text document engine: a keyed node tree with selection,
//! snapshot history, scoped read/write transactions, and a prioritized
//! command bus. UI layers subscribe to it; nothing here renders.

mod command;
mod edits;
mod editor;
mod selection;
mod tree;
mod value;

pub use crate::command::*;
pub use crate::editor::*;
pub use crate::selection::*;
pub use crate::tree::*;
pub use crate::value::*;
