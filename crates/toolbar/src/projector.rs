//! Pure projection from document and selection to toolbar state. Called
//! from the controller's subscriptions; never mutates the document.

use inkstone_core::{
    is_at_node_end, DocumentTree, HeadingLevel, NodeBody, NodeKey, RangeSelection, ReadTx,
    Selection, TextFormat,
};

use crate::state::{ActiveFormats, BlockKind, ToolbarState};

/// Project the current document into a fresh `ToolbarState`. Non-range
/// selections leave the previous state standing; undo/redo availability
/// and alignment are carried over, the rest is recomputed.
pub fn project(tx: &ReadTx, prev: &ToolbarState) -> ToolbarState {
    let Selection::Range(range) = *tx.selection() else {
        return prev.clone();
    };
    let tree = tx.tree();
    let anchor = range.anchor;

    let element = if anchor.key == tree.root() {
        tree.root()
    } else {
        tree.top_level_ancestor(anchor.key).unwrap_or_else(|| tree.root())
    };

    let block_kind = match tree.nearest_list(anchor.key) {
        Some(list) => match tree.body(list) {
            Some(NodeBody::List { ordered: true }) => BlockKind::OrderedList,
            _ => BlockKind::UnorderedList,
        },
        None => classify_element(tree, element),
    };

    let code_language = match tree.body(element) {
        Some(NodeBody::Code { language }) => match language {
            Some(lang) if tx.code_languages().contains(&lang.as_str()) => lang.clone(),
            _ => tx.default_code_language().to_string(),
        },
        _ => prev.code_language.clone(),
    };

    let node = representative_node(tree, &range);
    let in_link =
        tree.is_link(node) || tree.parent(node).is_some_and(|parent| tree.is_link(parent));

    let mut active_formats = ActiveFormats::default();
    for flag in TextFormat::ALL {
        active_formats.set(flag, tx.selection_has_format(flag));
    }
    active_formats.link = in_link;

    ToolbarState {
        can_undo: prev.can_undo,
        can_redo: prev.can_redo,
        block_kind,
        selected_element: Some(element),
        code_language,
        active_formats,
        alignment: prev.alignment,
    }
}

fn classify_element(tree: &DocumentTree, element: NodeKey) -> BlockKind {
    match tree.body(element) {
        Some(NodeBody::Heading {
            level: HeadingLevel::H1,
        }) => BlockKind::H1,
        Some(NodeBody::Heading {
            level: HeadingLevel::H2,
        }) => BlockKind::H2,
        Some(NodeBody::Quote) => BlockKind::Quote,
        Some(NodeBody::Code { .. }) => BlockKind::Code,
        Some(NodeBody::List { ordered: true }) => BlockKind::OrderedList,
        Some(NodeBody::List { ordered: false }) => BlockKind::UnorderedList,
        Some(
            NodeBody::Root
            | NodeBody::Paragraph
            | NodeBody::ListItem { .. }
            | NodeBody::Link { .. }
            | NodeBody::Text { .. },
        )
        | None => BlockKind::Paragraph,
    }
}

/// The leaf the selection "points at" for link detection. With both ends
/// on one leaf that leaf wins; otherwise the leading end wins unless the
/// caret side sits exactly on a node boundary, in which case the interior
/// end is used.
fn representative_node(tree: &DocumentTree, range: &RangeSelection) -> NodeKey {
    let (anchor, focus) = (range.anchor, range.focus);
    if anchor.key == focus.key {
        return anchor.key;
    }
    if range.is_backward(tree) {
        if is_at_node_end(tree, &focus) {
            anchor.key
        } else {
            focus.key
        }
    } else if is_at_node_end(tree, &anchor) {
        focus.key
    } else {
        anchor.key
    }
}
