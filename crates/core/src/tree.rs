use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable node identifier. Keys survive structural edits for as long as the
/// node itself does; they are never reused within one tree.
pub type NodeKey = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingLevel {
    H1,
    H2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Character-level style flags carried by text leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl TextFormat {
    pub const ALL: [TextFormat; 5] = [
        TextFormat::Bold,
        TextFormat::Italic,
        TextFormat::Underline,
        TextFormat::Strikethrough,
        TextFormat::Code,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatSet {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl FormatSet {
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

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Closed set of node kinds. Classification sites match exhaustively, so a
/// new kind forces every site to be revisited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeBody {
    Root,
    Paragraph,
    Heading {
        level: HeadingLevel,
    },
    Quote,
    List {
        ordered: bool,
    },
    ListItem {
        #[serde(default)]
        depth: u8,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Link {
        url: String,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "FormatSet::is_empty")]
        formats: FormatSet,
    },
}

impl NodeBody {
    pub fn is_text(&self) -> bool {
        matches!(self, NodeBody::Text { .. })
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, NodeBody::Text { .. } | NodeBody::Link { .. })
    }

    /// Whether an element of this kind may directly contain text leaves.
    pub fn hosts_leaves(&self) -> bool {
        matches!(
            self,
            NodeBody::Paragraph
                | NodeBody::Heading { .. }
                | NodeBody::Quote
                | NodeBody::ListItem { .. }
                | NodeBody::Code { .. }
                | NodeBody::Link { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    body: NodeBody,
    align: Alignment,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// Keyed node tree. Every node except the root has exactly one parent; the
/// root has none and always exists.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: HashMap<NodeKey, NodeRecord>,
    root: NodeKey,
    next_key: NodeKey,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// An empty document: root holding one empty paragraph.
    pub fn new() -> Self {
        let mut tree = Self::bare();
        let paragraph = tree.create(NodeBody::Paragraph);
        let text = tree.create(NodeBody::Text {
            text: String::new(),
            formats: FormatSet::default(),
        });
        let root = tree.root;
        tree.attach(root, 0, paragraph);
        tree.attach(paragraph, 0, text);
        tree
    }

    pub(crate) fn bare() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            1,
            NodeRecord {
                body: NodeBody::Root,
                align: Alignment::default(),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root: 1,
            next_key: 2,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn body(&self, key: NodeKey) -> Option<&NodeBody> {
        self.nodes.get(&key).map(|record| &record.body)
    }

    pub fn alignment(&self, key: NodeKey) -> Alignment {
        self.nodes
            .get(&key)
            .map(|record| record.align)
            .unwrap_or_default()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|record| record.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_list(&self, key: NodeKey) -> bool {
        matches!(self.body(key), Some(NodeBody::List { .. }))
    }

    pub fn is_heading(&self, key: NodeKey) -> bool {
        matches!(self.body(key), Some(NodeBody::Heading { .. }))
    }

    pub fn is_code(&self, key: NodeKey) -> bool {
        matches!(self.body(key), Some(NodeBody::Code { .. }))
    }

    pub fn is_link(&self, key: NodeKey) -> bool {
        matches!(self.body(key), Some(NodeBody::Link { .. }))
    }

    /// Byte length of a text leaf; zero for anything else.
    pub fn text_len(&self, key: NodeKey) -> usize {
        match self.body(key) {
            Some(NodeBody::Text { text, .. }) => text.len(),
            _ => 0,
        }
    }

    pub fn formats(&self, key: NodeKey) -> FormatSet {
        match self.body(key) {
            Some(NodeBody::Text { formats, .. }) => *formats,
            _ => FormatSet::default(),
        }
    }

    /// The element whose parent is the root, or the root itself for the
    /// root key. `None` for detached keys.
    pub fn top_level_ancestor(&self, key: NodeKey) -> Option<NodeKey> {
        if key == self.root {
            return Some(self.root);
        }
        let mut current = key;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Nearest ancestor (including `key` itself) that is a List node.
    pub fn nearest_list(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(node) = current {
            if self.is_list(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Text leaves of the whole document in traversal order.
    pub fn text_leaves(&self) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, key: NodeKey, out: &mut Vec<NodeKey>) {
        match self.body(key) {
            Some(NodeBody::Text { .. }) => out.push(key),
            Some(_) => {
                for child in self.children(key).to_vec() {
                    self.collect_leaves(child, out);
                }
            }
            None => {}
        }
    }

    /// Child-index path from the root, used for document-order comparison.
    pub fn path(&self, key: NodeKey) -> Option<Vec<usize>> {
        if key == self.root {
            return Some(Vec::new());
        }
        let mut path = Vec::new();
        let mut current = key;
        loop {
            let parent = self.parent(current)?;
            let index = self
                .children(parent)
                .iter()
                .position(|child| *child == current)?;
            path.push(index);
            if parent == self.root {
                break;
            }
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    pub fn first_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        match self.body(key)? {
            NodeBody::Text { .. } => Some(key),
            _ => self
                .children(key)
                .iter()
                .find_map(|child| self.first_text_descendant(*child)),
        }
    }

    /// Concatenated leaf text, one line per leaf-hosting block. List items
    /// count as blocks, inline links do not.
    pub fn to_plain_text(&self) -> String {
        let mut lines = Vec::new();
        self.collect_lines(self.root, &mut lines);
        lines.join("\n")
    }

    fn collect_lines(&self, key: NodeKey, lines: &mut Vec<String>) {
        match self.body(key) {
            Some(body) if body.hosts_leaves() && !body.is_inline() => {
                let mut leaves = Vec::new();
                self.collect_leaves(key, &mut leaves);
                let mut line = String::new();
                for leaf in leaves {
                    if let Some(NodeBody::Text { text, .. }) = self.body(leaf) {
                        line.push_str(text);
                    }
                }
                lines.push(line);
            }
            Some(_) => {
                for child in self.children(key).to_vec() {
                    self.collect_lines(child, lines);
                }
            }
            None => {}
        }
    }

    pub(crate) fn create(&mut self, body: NodeBody) -> NodeKey {
        let key = self.next_key;
        self.next_key += 1;
        self.nodes.insert(
            key,
            NodeRecord {
                body,
                align: Alignment::default(),
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    pub(crate) fn body_mut(&mut self, key: NodeKey) -> Option<&mut NodeBody> {
        self.nodes.get_mut(&key).map(|record| &mut record.body)
    }

    pub(crate) fn set_alignment(&mut self, key: NodeKey, align: Alignment) -> bool {
        match self.nodes.get_mut(&key) {
            Some(record) if record.align != align => {
                record.align = align;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_alignment_raw(&mut self, key: NodeKey, align: Alignment) {
        if let Some(record) = self.nodes.get_mut(&key) {
            record.align = align;
        }
    }

    /// Insert `key` as the `index`-th child of `parent`. The node must be
    /// detached.
    pub(crate) fn attach(&mut self, parent: NodeKey, index: usize, key: NodeKey) {
        debug_assert!(self.parent(key).is_none() && key != self.root);
        if let Some(record) = self.nodes.get_mut(&key) {
            record.parent = Some(parent);
        }
        if let Some(record) = self.nodes.get_mut(&parent) {
            let index = index.min(record.children.len());
            record.children.insert(index, key);
        }
    }

    /// Unlink `key` from its parent, returning its former child index.
    pub(crate) fn detach(&mut self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        let index = self
            .children(parent)
            .iter()
            .position(|child| *child == key)?;
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.remove(index);
        }
        if let Some(record) = self.nodes.get_mut(&key) {
            record.parent = None;
        }
        Some(index)
    }

    /// Drop a detached node record. Children must have been moved first.
    pub(crate) fn release(&mut self, key: NodeKey) {
        debug_assert!(self.children(key).is_empty());
        self.nodes.remove(&key);
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub(crate) fn move_children(&mut self, from: NodeKey, to: NodeKey) {
        let children: Vec<NodeKey> = self.children(from).to_vec();
        if let Some(record) = self.nodes.get_mut(&from) {
            record.children.clear();
        }
        for child in children {
            if let Some(record) = self.nodes.get_mut(&child) {
                record.parent = Some(to);
            }
            if let Some(record) = self.nodes.get_mut(&to) {
                record.children.push(child);
            }
        }
    }
}
