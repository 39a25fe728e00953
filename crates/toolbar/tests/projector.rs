use inkstone_core::{
    DocumentValue, Editor, EditorConfig, Point, Selection, TextFormat,
};
use inkstone_toolbar::{project, BlockKind, ToolbarState};
use serde_json::json;

fn editor_from(doc: serde_json::Value) -> Editor {
    let value: DocumentValue = serde_json::from_value(doc).unwrap();
    Editor::from_value(value).unwrap()
}

fn project_now(editor: &Editor, prev: &ToolbarState) -> ToolbarState {
    editor.read(|tx| project(tx, prev))
}

fn initial(editor: &Editor) -> ToolbarState {
    ToolbarState::initial(&editor.config().default_code_language)
}

#[test]
fn heading_selection_projects_h1() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "heading", "level": "h1", "children": [
                    { "kind": "text", "text": "Title" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 0), Point::new(leaf, 5)));

    let state = project_now(&editor, &initial(&editor));
    assert_eq!(state.block_kind, BlockKind::H1);
    let element = editor.read(|tx| tx.tree().children(tx.tree().root())[0]);
    assert_eq!(state.selected_element, Some(element));
}

#[test]
fn list_wins_over_the_enclosing_block() {
    // An ordered list nested under a quote still reports as a list.
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "quote", "children": [
                    { "kind": "list", "ordered": true, "children": [
                        { "kind": "list_item", "children": [
                            { "kind": "text", "text": "deep" }
                        ]}
                    ]}
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 0), Point::new(leaf, 4)));

    let state = project_now(&editor, &initial(&editor));
    assert_eq!(state.block_kind, BlockKind::OrderedList);
}

#[test]
fn unknown_code_language_falls_back_to_default() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "code", "language": "brainfuck", "children": [
                    { "kind": "text", "text": "+-+-" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 0), Point::new(leaf, 4)));

    let state = project_now(&editor, &initial(&editor));
    assert_eq!(state.block_kind, BlockKind::Code);
    assert_eq!(state.code_language, "js");
}

#[test]
fn known_code_language_is_kept() {
    let editor = Editor::from_value_with_config(
        serde_json::from_value(json!({
            "root": {
                "kind": "root",
                "children": [
                    { "kind": "code", "language": "py", "children": [
                        { "kind": "text", "text": "print(1)" }
                    ]}
                ]
            }
        }))
        .unwrap(),
        EditorConfig {
            default_code_language: "rust".to_string(),
            max_undo: 0,
        }
        .with_defaults(),
    )
    .unwrap();
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 0), Point::new(leaf, 8)));

    let state = project_now(&editor, &initial(&editor));
    assert_eq!(state.code_language, "py");
}

#[test]
fn non_range_selection_keeps_previous_state() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "hello" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);

    let mut prev = initial(&editor);
    prev.block_kind = BlockKind::Quote;
    prev.can_undo = true;

    editor.set_selection(Selection::Caret(Point::new(leaf, 2)));
    let state = project_now(&editor, &prev);
    assert_eq!(state, prev);
}

#[test]
fn formats_reflect_the_whole_selection() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "bold", "formats": { "bold": true, "italic": true } },
                    { "kind": "text", "text": " and", "formats": { "bold": true } }
                ]}
            ]
        }
    }));
    let leaves = editor.read(|tx| tx.tree().text_leaves());
    editor.set_selection(Selection::range(
        Point::new(leaves[0], 0),
        Point::new(leaves[1], 4),
    ));

    let state = project_now(&editor, &initial(&editor));
    assert!(state.active_formats.bold);
    assert!(!state.active_formats.italic);
    assert!(!state.active_formats.link);
}

#[test]
fn selection_ending_inside_a_link_lights_the_link_flag() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "go " },
                    { "kind": "link", "url": "https://example.com", "children": [
                        { "kind": "text", "text": "here" }
                    ]}
                ]}
            ]
        }
    }));
    let leaves = editor.read(|tx| tx.tree().text_leaves());

    // Forward selection starting at the very end of the plain leaf: the
    // link leaf is the representative node.
    editor.set_selection(Selection::range(
        Point::new(leaves[0], 3),
        Point::new(leaves[1], 2),
    ));
    let state = project_now(&editor, &initial(&editor));
    assert!(state.active_formats.link);

    // Starting mid-leaf, the plain leaf represents the selection.
    editor.set_selection(Selection::range(
        Point::new(leaves[0], 1),
        Point::new(leaves[1], 2),
    ));
    let state = project_now(&editor, &initial(&editor));
    assert!(!state.active_formats.link);
}

#[test]
fn carried_fields_come_from_previous_state() {
    let editor = editor_from(json!({
        "root": {
            "kind": "root",
            "children": [
                { "kind": "paragraph", "children": [
                    { "kind": "text", "text": "hello" }
                ]}
            ]
        }
    }));
    let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
    editor.set_selection(Selection::range(Point::new(leaf, 0), Point::new(leaf, 5)));

    let mut prev = initial(&editor);
    prev.can_undo = true;
    prev.can_redo = true;
    prev.alignment = inkstone_core::Alignment::Center;

    let state = project_now(&editor, &prev);
    assert!(state.can_undo);
    assert!(state.can_redo);
    assert_eq!(state.alignment, inkstone_core::Alignment::Center);
    assert_eq!(state.block_kind, BlockKind::Paragraph);
    assert!(!state.active_formats.contains(TextFormat::Bold));
}
