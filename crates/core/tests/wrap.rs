use inkstone_core::{
    Alignment, DocumentValue, Editor, EngineError, HeadingLevel, NodeBody, Point, RangeSelection,
};
use serde_json::json;

fn editor_from(doc: serde_json::Value) -> Editor {
    let value: DocumentValue = serde_json::from_value(doc).unwrap();
    Editor::from_value(value).unwrap()
}

#[test]
fn paragraph_becomes_heading_with_text_intact() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "title" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    let range = RangeSelection::new(Point::new(leaf, 0), Point::new(leaf, 0));

    editor
        .update(|tx| {
            tx.wrap_leaves_in(&range, || NodeBody::Heading {
                level: HeadingLevel::H1,
            })
        })
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let top = tree.children(tree.root())[0];
        let Some(NodeBody::Heading { level }) = tree.body(top) else {
            panic!("expected a heading");
        };
        assert_eq!(*level, HeadingLevel::H1);
        assert_eq!(tree.to_plain_text(), "title");
        // The leaf key is unchanged, only its parent was replaced.
        assert_eq!(tree.children(top), &[leaf]);
    });
}

#[test]
fn wrap_spans_multiple_blocks() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [{ "kind": "text", "text": "one" }]},
                { "kind": "paragraph", "children": [{ "kind": "text", "text": "two" }]},
                { "kind": "paragraph", "children": [{ "kind": "text", "text": "three" }]}
            ]
        }
    }));
    let leaves = editor.read(|tx| tx.tree().text_leaves());
    let range = RangeSelection::new(Point::new(leaves[0], 1), Point::new(leaves[1], 2));

    editor
        .update(|tx| tx.wrap_leaves_in(&range, || NodeBody::Quote))
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let tops = tree.children(tree.root());
        assert_eq!(tops.len(), 3);
        assert!(matches!(tree.body(tops[0]), Some(NodeBody::Quote)));
        assert!(matches!(tree.body(tops[1]), Some(NodeBody::Quote)));
        assert!(matches!(tree.body(tops[2]), Some(NodeBody::Paragraph)));
        assert_eq!(tree.to_plain_text(), "one\ntwo\nthree");
    });
}

#[test]
fn wrap_keeps_block_alignment() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "align": "center", "children": [
                    { "kind": "text", "text": "centered" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    let range = RangeSelection::new(Point::new(leaf, 0), Point::new(leaf, 8));

    editor
        .update(|tx| tx.wrap_leaves_in(&range, || NodeBody::Quote))
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let top = tree.children(tree.root())[0];
        assert_eq!(tree.alignment(top), Alignment::Center);
    });
}

#[test]
fn wrapping_a_list_is_a_structure_error() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "list", "ordered": false, "children": [
                    { "kind": "list_item", "children": [
                        { "kind": "text", "text": "item" }
                    ]}
                ]}
            ]
        }
    }));
    let before = editor.to_value();
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    let range = RangeSelection::new(Point::new(leaf, 0), Point::new(leaf, 4));

    let result = editor.update(|tx| {
        tx.wrap_leaves_in(&range, || NodeBody::Heading {
            level: HeadingLevel::H2,
        })
    });

    let Err(EngineError::InvalidStructure(_)) = result else {
        panic!("expected a structure error, got {result:?}");
    };
    assert_eq!(editor.to_value(), before);
}

#[test]
fn wrap_into_code_block() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "let x = 1;" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    let range = RangeSelection::new(Point::new(leaf, 0), Point::new(leaf, 0));

    editor
        .update(|tx| tx.wrap_leaves_in(&range, || NodeBody::Code { language: None }))
        .unwrap();

    editor.read(|tx| {
        let tree = tx.tree();
        let top = tree.children(tree.root())[0];
        let Some(NodeBody::Code { language }) = tree.body(top) else {
            panic!("expected a code block");
        };
        assert!(language.is_none());
    });

    // Language set afterwards through the write capability.
    let top = editor.read(|tx| tx.tree().children(tx.tree().root())[0]);
    editor
        .update(|tx| tx.set_code_language(top, "rust"))
        .unwrap();
    editor.read(|tx| {
        let Some(NodeBody::Code { language }) = tx.tree().body(top) else {
            panic!("expected a code block");
        };
        assert_eq!(language.as_deref(), Some("rust"));
    });
}
