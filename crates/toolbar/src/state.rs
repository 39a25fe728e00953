use inkstone_core::{Alignment, NodeKey, TextFormat};

/// Block classification shown by the block-type dropdown. Lists win over
/// every other kind: a selection inside a list item reports the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    H1,
    H2,
    OrderedList,
    UnorderedList,
    Quote,
    Code,
}

impl BlockKind {
    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::OrderedList | BlockKind::UnorderedList)
    }
}

/// Inline formats lit up in the toolbar: the five character flags plus the
/// synthetic link indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveFormats {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
}

impl ActiveFormats {
    pub fn contains(&self, flag: TextFormat) -> bool {
        match flag {
            TextFormat::Bold => self.bold,
            TextFormat::Italic => self.italic,
            TextFormat::Underline => self.underline,
            TextFormat::Strikethrough => self.strikethrough,
            TextFormat::Code => self.code,
        }
    }

    pub fn set(&mut self, flag: TextFormat, on: bool) {
        match flag {
            TextFormat::Bold => self.bold = on,
            TextFormat::Italic => self.italic = on,
            TextFormat::Underline => self.underline = on,
            TextFormat::Strikethrough => self.strikethrough = on,
            TextFormat::Code => self.code = on,
        }
    }

    pub fn with(mut self, flag: TextFormat) -> Self {
        self.set(flag, true);
        self
    }

    /// Text flags whose value differs between the two sets, in declaration
    /// order. The link flag is not a text format and is compared separately.
    pub fn flipped_against(&self, other: &ActiveFormats) -> Vec<TextFormat> {
        TextFormat::ALL
            .into_iter()
            .filter(|flag| self.contains(*flag) != other.contains(*flag))
            .collect()
    }
}

/// Everything the toolbar renders. A value type; the controller replaces
/// it wholesale on each reprojection.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub block_kind: BlockKind,
    pub selected_element: Option<NodeKey>,
    pub code_language: String,
    pub active_formats: ActiveFormats,
    pub alignment: Alignment,
}

impl ToolbarState {
    pub fn initial(default_code_language: &str) -> Self {
        Self {
            can_undo: false,
            can_redo: false,
            block_kind: BlockKind::Paragraph,
            selected_element: None,
            code_language: default_code_language.to_string(),
            active_formats: ActiveFormats::default(),
            alignment: Alignment::Left,
        }
    }
}
