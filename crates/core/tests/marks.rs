use inkstone_core::{
    DocumentValue, Editor, NodeBody, Point, Selection, TextFormat,
};
use serde_json::json;

fn editor_from(doc: serde_json::Value) -> Editor {
    let value: DocumentValue = serde_json::from_value(doc).unwrap();
    Editor::from_value(value).unwrap()
}

fn single_paragraph(text: &str) -> Editor {
    editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": text }
                ]}
            ]
        }
    }))
}

#[test]
fn partial_selection_splits_the_leaf() {
    let editor = single_paragraph("hello world");
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 6), Point::new(leaf, 11)));

    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Bold);
            Ok(())
        })
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let leaves = tree.text_leaves();
        assert_eq!(leaves.len(), 2);
        let Some(NodeBody::Text { text, formats }) = tree.body(leaves[0]) else {
            panic!("expected a text leaf");
        };
        assert_eq!(text, "hello ");
        assert!(!formats.contains(TextFormat::Bold));
        let Some(NodeBody::Text { text, formats }) = tree.body(leaves[1]) else {
            panic!("expected a text leaf");
        };
        assert_eq!(text, "world");
        assert!(formats.contains(TextFormat::Bold));
        assert_eq!(tree.to_plain_text(), "hello world");
    });
}

#[test]
fn mixed_span_formats_everything_then_clears() {
    // "hello " plain, "world" bold: the flag does not hold everywhere, so
    // the first toggle turns it on across the span.
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "hello " },
                    { "kind": "text", "text": "world", "formats": { "bold": true } }
                ]}
            ]
        }
    }));
    let leaves = editor.read(|tx| tx.tree().text_leaves());
    editor.set_selection(Selection::range(
        Point::new(leaves[0], 0),
        Point::new(leaves[1], 5),
    ));

    assert!(!editor.read(|tx| tx.selection_has_format(TextFormat::Bold)));
    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Bold);
            Ok(())
        })
        .unwrap();
    assert!(editor.read(|tx| tx.selection_has_format(TextFormat::Bold)));

    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Bold);
            Ok(())
        })
        .unwrap();
    assert!(!editor.read(|tx| tx.selection_has_format(TextFormat::Bold)));
}

#[test]
fn toggle_preserves_text_and_selection_keys() {
    let editor = single_paragraph("abcdef");
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 2), Point::new(leaf, 4)));

    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Italic);
            Ok(())
        })
        .unwrap();

    editor.read(|tx| {
        assert_eq!(tx.tree().to_plain_text(), "abcdef");
        // The anchor leaf key survived the split.
        let Selection::Range(range) = *tx.selection() else {
            panic!("expected a range");
        };
        assert!(tx.tree().contains(range.anchor.key));
        assert!(tx.tree().contains(range.focus.key));
    });
}

#[test]
fn caret_selection_does_not_mutate() {
    let editor = single_paragraph("hello");
    let before = editor.to_value();
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::Caret(Point::new(leaf, 3)));

    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Bold);
            Ok(())
        })
        .unwrap();

    assert_eq!(editor.to_value(), before);
    assert!(!editor.can_undo());
}

#[test]
fn backward_range_formats_the_same_span() {
    let editor = single_paragraph("hello world");
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 11), Point::new(leaf, 6)));

    editor
        .update(|tx| {
            tx.toggle_format(TextFormat::Underline);
            Ok(())
        })
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let leaves = tree.text_leaves();
        assert_eq!(leaves.len(), 2);
        assert!(tree.formats(leaves[1]).contains(TextFormat::Underline));
        assert!(!tree.formats(leaves[0]).contains(TextFormat::Underline));
    });
}
