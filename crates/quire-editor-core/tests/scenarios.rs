//! End-to-end editing scenarios driven through the public editor API.

use quire_editor_core::{
    Delta, DocumentTree, EditorConfig, EditorDiagnostic, Node, RegionRegistry, RichTextEditor,
    Selection, TabStop, plain_text, protected_run_count, tabs,
};
use std::time::Duration;

fn editor() -> RichTextEditor {
    RichTextEditor::new(EditorConfig::default()).unwrap()
}

fn tab_editor() -> RichTextEditor {
    let mut editor = editor();
    editor.set_tab_stops(vec![TabStop::left(100.0)]).unwrap();
    editor.focus();
    editor
}

fn first_line_children(editor: &RichTextEditor) -> Vec<Node> {
    editor.tree().lines().next().unwrap().children.clone()
}

fn fragment_paddings(editor: &RichTextEditor) -> Vec<f32> {
    editor
        .tree()
        .lines()
        .flat_map(|line| line.children.iter())
        .filter_map(|node| match node {
            Node::Fragment { padding, .. } => Some(*padding),
            _ => None,
        })
        .collect()
}

#[test]
fn test_plain_value_renders_plain_paragraph() {
    let mut editor = editor();
    editor.set_value(r#"[{"insert":"Hello World\n"}]"#);
    assert_eq!(editor.html(), "<p>Hello World</p>");
    assert_eq!(editor.value(), r#"[{"insert":"Hello World\n"}]"#);
    assert!(editor.take_diagnostics().is_empty());
}

#[test]
fn test_delete_across_readonly_boundary_is_reverted() {
    let mut editor = editor();
    editor.set_value(r#"[{"insert":"abc secret xyz\n"}]"#);
    editor.select(4, 6).unwrap();
    assert!(editor.toggle_readonly().unwrap());
    assert_eq!(editor.protected_run_count(), 1);
    let before = editor.delta().clone();

    editor.select(2, 4).unwrap();
    assert!(!editor.delete_backward().unwrap());

    assert_eq!(editor.delta(), &before);
    assert_eq!(editor.protected_run_count(), 1);
    assert_eq!(editor.selection(), Selection::caret(3));
    let diagnostics = editor.take_diagnostics();
    assert!(matches!(
        diagnostics.as_slice(),
        [EditorDiagnostic::GuardRollback {
            before: 1,
            after: 0,
            ..
        }]
    ));
}

#[test]
fn test_delete_inside_readonly_span_is_allowed() {
    let mut editor = editor();
    editor.set_value(r#"[{"insert":"abc secret xyz\n"}]"#);
    editor.select(4, 6).unwrap();
    editor.toggle_readonly().unwrap();

    editor.select(5, 2).unwrap();
    assert!(editor.delete_backward().unwrap());
    assert_eq!(editor.protected_run_count(), 1);
    assert!(editor.take_diagnostics().is_empty());
}

#[test]
fn test_first_tab_fragment_is_offset_to_stop() {
    let mut editor = tab_editor();
    editor.insert_tab().unwrap();
    editor.insert_text("X").unwrap();
    editor.render_tick();

    let children = first_line_children(&editor);
    assert!(matches!(children[0], Node::Tab { level: 1, .. }));
    match &children[1] {
        Node::Fragment { children, padding } => {
            assert_eq!(*padding, 100.0 - editor.config().content_inset);
            assert_eq!(children.len(), 1);
            assert_eq!(children[0].text(), "X");
        }
        other => panic!("expected fragment after tab, got {other:?}"),
    }
}

#[test]
fn test_two_tab_keystrokes_make_one_level_two_tab() {
    let mut editor = tab_editor();
    editor.insert_tab().unwrap();
    editor.insert_tab().unwrap();

    let tabs: Vec<u32> = first_line_children(&editor)
        .iter()
        .filter_map(|node| match node {
            Node::Tab { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(tabs, vec![2]);
    assert!(
        !first_line_children(&editor)
            .iter()
            .any(|node| matches!(node, Node::PendingTab { .. }))
    );
}

#[test]
fn test_merged_tab_keeps_caret_before_text() {
    let mut editor = tab_editor();
    editor
        .set_tab_stops(vec![TabStop::left(100.0), TabStop::left(200.0)])
        .unwrap();
    editor.set_value(r#"[{"insert":"ab\n"}]"#);
    editor.select(0, 0).unwrap();

    editor.insert_tab().unwrap();
    assert_eq!(editor.selection(), Selection::caret(1));
    editor.insert_tab().unwrap();
    assert_eq!(editor.selection(), Selection::caret(1));
    editor.insert_text("X").unwrap();

    assert_eq!(plain_text(editor.delta()), "Xab\n");
    let children = first_line_children(&editor);
    assert!(matches!(children[0], Node::Tab { level: 2, .. }));
    assert_eq!(children[1].text(), "Xab");
}

#[test]
fn test_tab_after_text_starts_new_marker() {
    let mut editor = tab_editor();
    editor.insert_tab().unwrap();
    editor.insert_text("X").unwrap();
    editor.insert_tab().unwrap();

    let levels: Vec<u32> = first_line_children(&editor)
        .iter()
        .filter_map(|node| match node {
            Node::Tab { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![1, 1]);
}

#[test]
fn test_empty_value_clears_document() {
    let mut editor = editor();
    editor.set_value(r#"[{"insert":"some text\n"}]"#);
    assert_eq!(editor.html(), "<p>some text</p>");

    editor.set_value("");
    assert!(editor.is_empty());
    assert_eq!(editor.value(), "");
    assert_eq!(editor.html(), "<p><br></p>");
}

#[test]
fn test_html_follows_typing_after_window() {
    let mut editor = editor();
    editor.focus();
    editor.insert_text("typed").unwrap();
    assert_eq!(editor.html(), "<p><br></p>");
    editor.advance(Duration::from_millis(200));
    assert_eq!(editor.html(), "<p>typed</p>");
}

// Invariants over a handful of representative documents.

const DOCUMENTS: &[&str] = &[
    r#"[{"insert":"Hello World\n"}]"#,
    r#"[{"insert":"abc "},{"insert":"secret","attributes":{"readonly":true}},{"insert":" xyz\n"}]"#,
    r#"[{"insert":"Title"},{"insert":"\n","attributes":{"header":1}},{"insert":"one"},{"insert":"\n","attributes":{"list":"bullet"}}]"#,
    r#"[{"insert":"\ufeff","attributes":{"tab":"2"}},{"insert":"X"},{"insert":"\n","attributes":{"tabs-cont":true}}]"#,
    r#"[{"insert":"a"},{"insert":{"nbsp":true}},{"insert":"b\n"}]"#,
];

#[test]
fn test_value_round_trips() {
    for doc in DOCUMENTS {
        let mut editor = editor();
        editor.set_value(doc);
        let settled = editor.value().to_string();
        let mut second = self::editor();
        second.set_value(&settled);
        assert_eq!(second.delta(), editor.delta(), "{doc}");
        assert_eq!(second.value(), settled, "{doc}");
    }
}

#[test]
fn test_normalization_is_idempotent() {
    let registry = RegionRegistry::standard();
    for doc in DOCUMENTS {
        let log = Delta::from_json(doc).unwrap();
        let mut once = DocumentTree::build(&registry, &log, None);
        tabs::normalize(&mut once, &registry);
        let first = once.to_delta();

        let mut twice = DocumentTree::build(&registry, &first, None);
        tabs::normalize(&mut twice, &registry);
        tabs::normalize(&mut twice, &registry);
        assert_eq!(twice.to_delta(), first, "{doc}");
    }
}

#[test]
fn test_user_edits_never_remove_protected_runs() {
    let doc = DOCUMENTS[1];
    let len = Delta::from_json(doc).unwrap().length();
    for index in 0..len - 1 {
        for length in 1..len - index {
            let mut editor = editor();
            editor.set_value(doc);
            let before = protected_run_count(editor.delta());
            editor.select(index, length).unwrap();
            editor.delete_forward().unwrap();
            assert_eq!(
                protected_run_count(editor.delta()),
                before,
                "delete({index}, {length})"
            );
        }
    }
}

#[test]
fn test_layout_is_reproducible() {
    let run = || {
        let mut editor = tab_editor();
        editor
            .set_tab_stops(vec![TabStop::left(100.0), TabStop::left(240.0)])
            .unwrap();
        editor.insert_tab().unwrap();
        editor.insert_text("left").unwrap();
        editor.insert_tab().unwrap();
        editor.insert_text("right").unwrap();
        editor.render_tick();
        fragment_paddings(&editor)
    };
    let first = run();
    assert_eq!(first.len(), 2);
    assert_eq!(first, run());
}
