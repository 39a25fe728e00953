use serde::{Deserialize, Serialize};

use crate::tree::{DocumentTree, NodeKey};

/// One end of a selection: a node plus a byte offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Whether the focus precedes the anchor in document order.
    pub fn is_backward(&self, tree: &DocumentTree) -> bool {
        if self.anchor.key == self.focus.key {
            return self.focus.offset < self.anchor.offset;
        }
        match (tree.path(self.anchor.key), tree.path(self.focus.key)) {
            (Some(anchor_path), Some(focus_path)) => focus_path < anchor_path,
            _ => false,
        }
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self, tree: &DocumentTree) -> (Point, Point) {
        if self.is_backward(tree) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}

/// The active selection. Only the range kind is format-bearing; carets and
/// whole-node selections are ignored by span-wise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "selection", rename_all = "snake_case")]
pub enum Selection {
    Caret(Point),
    Range(RangeSelection),
    Node(NodeKey),
}

impl Selection {
    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range(_))
    }

    /// The point a caret or range anchors at, if any.
    pub fn anchor(&self) -> Option<Point> {
        match self {
            Selection::Caret(point) => Some(*point),
            Selection::Range(sel) => Some(sel.anchor),
            Selection::Node(_) => None,
        }
    }
}

/// Whether the point sits at the trailing boundary of its node's text.
pub fn is_at_node_end(tree: &DocumentTree, point: &Point) -> bool {
    point.offset >= tree.text_len(point.key)
}
