use crate::tree::{Alignment, TextFormat};

/// Everything that travels over the editor's command bus. Commands are
/// dispatched in registration-priority order; the engine's default behavior
/// runs only when no handler stopped propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Undo,
    Redo,
    CanUndoChanged(bool),
    CanRedoChanged(bool),
    SelectionChanged,
    FormatText(TextFormat),
    FormatElement(Alignment),
    ToggleLink(Option<String>),
    InsertList { ordered: bool },
    RemoveList,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Undo => CommandKind::Undo,
            Command::Redo => CommandKind::Redo,
            Command::CanUndoChanged(_) => CommandKind::CanUndoChanged,
            Command::CanRedoChanged(_) => CommandKind::CanRedoChanged,
            Command::SelectionChanged => CommandKind::SelectionChanged,
            Command::FormatText(_) => CommandKind::FormatText,
            Command::FormatElement(_) => CommandKind::FormatElement,
            Command::ToggleLink(_) => CommandKind::ToggleLink,
            Command::InsertList { .. } => CommandKind::InsertList,
            Command::RemoveList => CommandKind::RemoveList,
        }
    }
}

/// Payload-free discriminant used to register command handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Undo,
    Redo,
    CanUndoChanged,
    CanRedoChanged,
    SelectionChanged,
    FormatText,
    FormatElement,
    ToggleLink,
    InsertList,
    RemoveList,
}

/// Handler ordering on the bus. Higher priorities run first; ties run in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandPriority {
    Low,
    Normal,
    High,
}
