//! Structural and mark edits over the keyed tree. These are the engine
//! internals behind the command bus defaults and the write-transaction
//! primitives; everything here leaves text leaf keys stable wherever the
//! leaf itself survives, so selections keep pointing at live nodes.

use std::ops::Range;

use crate::editor::EngineError;
use crate::selection::{Point, RangeSelection, Selection};
use crate::tree::{Alignment, DocumentTree, NodeBody, NodeKey, TextFormat};

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// Clamp a selection to live text positions. Element points descend to
/// their first text leaf; dead keys collapse to the document start.
pub(crate) fn normalize_selection(tree: &DocumentTree, selection: Selection) -> Selection {
    let fallback = || {
        let leaf = tree
            .first_text_descendant(tree.root())
            .unwrap_or_else(|| tree.root());
        Selection::Caret(Point::new(leaf, 0))
    };

    let clamp = |point: Point| -> Option<Point> {
        match tree.body(point.key)? {
            NodeBody::Text { text, .. } => Some(Point::new(
                point.key,
                clamp_to_char_boundary(text, point.offset),
            )),
            _ => tree
                .first_text_descendant(point.key)
                .map(|leaf| Point::new(leaf, 0)),
        }
    };

    match selection {
        Selection::Caret(point) => clamp(point)
            .map(Selection::Caret)
            .unwrap_or_else(|| fallback()),
        Selection::Range(range) => match (clamp(range.anchor), clamp(range.focus)) {
            (Some(anchor), Some(focus)) => Selection::Range(RangeSelection::new(anchor, focus)),
            _ => fallback(),
        },
        Selection::Node(key) => {
            if tree.contains(key) {
                Selection::Node(key)
            } else {
                fallback()
            }
        }
    }
}

/// Text leaves covered by the range, in document order, each with the byte
/// range of the overlap. Boundary leaves may carry an empty overlap.
pub(crate) fn selected_leaf_ranges(
    tree: &DocumentTree,
    range: &RangeSelection,
) -> Vec<(NodeKey, Range<usize>)> {
    let (start, end) = range.ordered(tree);
    let leaves = tree.text_leaves();
    let Some(start_ix) = leaves.iter().position(|key| *key == start.key) else {
        return Vec::new();
    };
    let Some(end_ix) = leaves.iter().position(|key| *key == end.key) else {
        return Vec::new();
    };
    if start_ix > end_ix {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(end_ix - start_ix + 1);
    for (ix, key) in leaves
        .iter()
        .enumerate()
        .take(end_ix + 1)
        .skip(start_ix)
        .map(|(ix, key)| (ix, *key))
    {
        let len = tree.text_len(key);
        let from = if ix == start_ix {
            start.offset.min(len)
        } else {
            0
        };
        let to = if ix == end_ix { end.offset.min(len) } else { len };
        out.push((key, from..to));
    }
    out
}

/// Whether the flag holds across the entire span. A span with no covered
/// text falls back to the anchor leaf's formats.
pub(crate) fn selection_has_format(
    tree: &DocumentTree,
    selection: &Selection,
    flag: TextFormat,
) -> bool {
    match selection {
        Selection::Range(range) => {
            let mut covered = selected_leaf_ranges(tree, range)
                .into_iter()
                .filter(|(_, overlap)| !overlap.is_empty())
                .peekable();
            if covered.peek().is_none() {
                return tree.formats(range.anchor.key).contains(flag);
            }
            covered.all(|(key, _)| tree.formats(key).contains(flag))
        }
        Selection::Caret(point) => tree.formats(point.key).contains(flag),
        Selection::Node(_) => false,
    }
}

/// Split a text leaf in two at `at`, keeping the left part under the
/// original key. Selection points past the split move to the new leaf.
fn split_text(
    tree: &mut DocumentTree,
    selection: &mut Selection,
    key: NodeKey,
    at: usize,
) -> NodeKey {
    let Some(parent) = tree.parent(key) else {
        return key;
    };
    let Some(index) = tree.children(parent).iter().position(|child| *child == key) else {
        return key;
    };

    let at = match tree.body(key) {
        Some(NodeBody::Text { text, .. }) => clamp_to_char_boundary(text, at),
        _ => return key,
    };
    let (right_text, formats) = match tree.body_mut(key) {
        Some(NodeBody::Text { text, formats }) => (text.split_off(at), *formats),
        _ => return key,
    };

    let right = tree.create(NodeBody::Text {
        text: right_text,
        formats,
    });
    tree.attach(parent, index + 1, right);

    let remap = |point: &mut Point| {
        if point.key == key && point.offset > at {
            point.key = right;
            point.offset -= at;
        }
    };
    match selection {
        Selection::Caret(point) => remap(point),
        Selection::Range(range) => {
            remap(&mut range.anchor);
            remap(&mut range.focus);
        }
        Selection::Node(_) => {}
    }

    right
}

/// Split boundary leaves so the selection covers whole leaves only, and
/// return those leaves in document order.
fn isolate_selected_leaves(tree: &mut DocumentTree, selection: &mut Selection) -> Vec<NodeKey> {
    let Selection::Range(range) = *selection else {
        return Vec::new();
    };
    let ranges = selected_leaf_ranges(tree, &range);

    let mut out = Vec::new();
    for (key, overlap) in ranges {
        if overlap.is_empty() {
            continue;
        }
        let len = tree.text_len(key);
        let mut target = key;
        if overlap.end < len {
            split_text(tree, selection, key, overlap.end);
        }
        if overlap.start > 0 {
            target = split_text(tree, selection, key, overlap.start);
        }
        out.push(target);
    }
    out
}

/// Toggle an inline flag over the selection. The target value is the
/// negation of "every covered leaf already has it" (intersection
/// semantics), applied uniformly.
pub(crate) fn toggle_format(
    tree: &mut DocumentTree,
    selection: &mut Selection,
    flag: TextFormat,
) -> bool {
    if !selection.is_range() {
        return false;
    }
    let enabled = selection_has_format(tree, selection, flag);
    let target = !enabled;

    let mut changed = false;
    for key in isolate_selected_leaves(tree, selection) {
        if let Some(NodeBody::Text { formats, .. }) = tree.body_mut(key) {
            if formats.contains(flag) != target {
                formats.set(flag, target);
                changed = true;
            }
        }
    }
    changed
}

/// Top-level elements containing the selected leaves, in document order.
fn selected_top_levels(tree: &DocumentTree, range: &RangeSelection) -> Vec<NodeKey> {
    let root = tree.root();
    let mut tops: Vec<NodeKey> = Vec::new();
    for (key, _) in selected_leaf_ranges(tree, range) {
        let Some(top) = tree.top_level_ancestor(key) else {
            continue;
        };
        if top != root && tops.last() != Some(&top) {
            tops.push(top);
        }
    }
    tops
}

fn top_levels_for_selection(tree: &DocumentTree, selection: &Selection) -> Vec<NodeKey> {
    match selection {
        Selection::Range(range) => selected_top_levels(tree, range),
        Selection::Caret(point) => tree
            .top_level_ancestor(point.key)
            .filter(|top| *top != tree.root())
            .into_iter()
            .collect(),
        Selection::Node(key) => tree
            .top_level_ancestor(*key)
            .filter(|top| *top != tree.root())
            .into_iter()
            .collect(),
    }
}

/// Replace each selected top-level element with a fresh element from the
/// factory, re-homing the old element's inline children. Element kinds are
/// immutable once constructed, hence replace rather than retag.
pub(crate) fn wrap_leaves_in(
    tree: &mut DocumentTree,
    range: &RangeSelection,
    factory: &dyn Fn() -> NodeBody,
) -> Result<bool, EngineError> {
    let tops = selected_top_levels(tree, range);
    if tops.is_empty() {
        return Ok(false);
    }

    let root = tree.root();
    for top in tops {
        let body = factory();
        if !body.hosts_leaves() {
            return Err(EngineError::InvalidStructure(format!(
                "{body:?} cannot host text leaves"
            )));
        }
        let illegal_child = tree
            .children(top)
            .iter()
            .any(|child| !tree.body(*child).is_some_and(NodeBody::is_inline));
        if illegal_child {
            return Err(EngineError::InvalidStructure(format!(
                "children of {:?} cannot be re-homed under {body:?}",
                tree.body(top)
            )));
        }

        let align = tree.alignment(top);
        let Some(index) = tree.detach(top) else {
            continue;
        };
        let replacement = tree.create(body);
        tree.set_alignment_raw(replacement, align);
        tree.move_children(top, replacement);
        tree.attach(root, index, replacement);
        tree.release(top);
    }
    Ok(true)
}

/// Link nodes touching the selection (parents of covered leaves, plus the
/// anchor leaf's parent), deduplicated.
fn links_in_selection(tree: &DocumentTree, selection: &Selection) -> Vec<NodeKey> {
    let mut links: Vec<NodeKey> = Vec::new();
    let mut push = |key: Option<NodeKey>| {
        if let Some(key) = key {
            if tree.is_link(key) && !links.contains(&key) {
                links.push(key);
            }
        }
    };

    if let Selection::Range(range) = selection {
        for (leaf, _) in selected_leaf_ranges(tree, range) {
            push(tree.parent(leaf));
        }
    }
    if let Some(anchor) = selection.anchor() {
        push(tree.parent(anchor.key));
    }
    links
}

/// `Some(url)` wraps the selected leaves in Link nodes (or retargets the
/// enclosing one); `None` unwraps them, splicing children back in place.
pub(crate) fn toggle_link(
    tree: &mut DocumentTree,
    selection: &mut Selection,
    url: Option<&str>,
) -> bool {
    match url {
        Some(url) => {
            let existing = links_in_selection(tree, selection);
            if !existing.is_empty() {
                let mut changed = false;
                for link in existing {
                    if let Some(NodeBody::Link { url: current }) = tree.body_mut(link) {
                        if current != url {
                            *current = url.to_string();
                            changed = true;
                        }
                    }
                }
                return changed;
            }

            let leaves = isolate_selected_leaves(tree, selection);
            if leaves.is_empty() {
                return false;
            }

            // Group consecutive leaves sharing a parent, one Link per run.
            let mut runs: Vec<Vec<NodeKey>> = Vec::new();
            for leaf in leaves {
                let parent = tree.parent(leaf);
                let extend = runs.last().and_then(|run| run.last()).is_some_and(|prev| {
                    parent.is_some()
                        && tree.parent(*prev) == parent
                        && tree
                            .children(parent.unwrap_or(0))
                            .windows(2)
                            .any(|pair| pair[0] == *prev && pair[1] == leaf)
                });
                if extend {
                    if let Some(run) = runs.last_mut() {
                        run.push(leaf);
                    }
                } else {
                    runs.push(vec![leaf]);
                }
            }

            for run in runs {
                let Some(parent) = tree.parent(run[0]) else {
                    continue;
                };
                let Some(index) = tree.detach(run[0]) else {
                    continue;
                };
                let link = tree.create(NodeBody::Link {
                    url: url.to_string(),
                });
                tree.attach(parent, index, link);
                tree.attach(link, 0, run[0]);
                for leaf in run.into_iter().skip(1) {
                    tree.detach(leaf);
                    let end = tree.children(link).len();
                    tree.attach(link, end, leaf);
                }
            }
            true
        }
        None => {
            let links = links_in_selection(tree, selection);
            if links.is_empty() {
                return false;
            }
            for link in links {
                let Some(parent) = tree.parent(link) else {
                    continue;
                };
                let Some(mut index) = tree.detach(link) else {
                    continue;
                };
                for child in tree.children(link).to_vec() {
                    tree.detach(child);
                    tree.attach(parent, index, child);
                    index += 1;
                }
                tree.release(link);
            }
            true
        }
    }
}

/// Convert the selected top-level run into a List of ListItems. When the
/// anchor already sits inside a List, retag that list's ordering in place;
/// the engine owns the nesting bookkeeping either way.
pub(crate) fn insert_list(
    tree: &mut DocumentTree,
    selection: &Selection,
    ordered: bool,
) -> bool {
    if let Some(anchor) = selection.anchor() {
        if let Some(list) = tree.nearest_list(anchor.key) {
            return match tree.body_mut(list) {
                Some(NodeBody::List { ordered: current }) if *current != ordered => {
                    *current = ordered;
                    true
                }
                _ => false,
            };
        }
    }

    let tops = top_levels_for_selection(tree, selection);
    if tops.is_empty() {
        return false;
    }
    let root = tree.root();
    let Some(first_index) = tree
        .children(root)
        .iter()
        .position(|child| *child == tops[0])
    else {
        return false;
    };

    let list = tree.create(NodeBody::List { ordered });
    for top in tops {
        tree.detach(top);
        let item = tree.create(NodeBody::ListItem { depth: 0 });
        tree.move_children(top, item);
        let end = tree.children(list).len();
        tree.attach(list, end, item);
        tree.release(top);
    }
    tree.attach(root, first_index, list);
    true
}

/// Unwrap the nearest enclosing List: each ListItem becomes a Paragraph at
/// the list's former position; non-item children are hoisted as-is.
pub(crate) fn remove_list(tree: &mut DocumentTree, selection: &Selection) -> bool {
    let Some(anchor) = selection.anchor() else {
        return false;
    };
    let Some(list) = tree.nearest_list(anchor.key) else {
        return false;
    };
    let Some(parent) = tree.parent(list) else {
        return false;
    };
    let Some(mut index) = tree.detach(list) else {
        return false;
    };

    for child in tree.children(list).to_vec() {
        tree.detach(child);
        if matches!(tree.body(child), Some(NodeBody::ListItem { .. })) {
            let paragraph = tree.create(NodeBody::Paragraph);
            tree.move_children(child, paragraph);
            tree.attach(parent, index, paragraph);
            tree.release(child);
        } else {
            tree.attach(parent, index, child);
        }
        index += 1;
    }
    tree.release(list);
    true
}

pub(crate) fn set_alignment(
    tree: &mut DocumentTree,
    selection: &Selection,
    align: Alignment,
) -> bool {
    let mut changed = false;
    for top in top_levels_for_selection(tree, selection) {
        changed |= tree.set_alignment(top, align);
    }
    changed
}
