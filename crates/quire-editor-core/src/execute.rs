//! Action execution for the editing surface.

use std::time::Duration;

use serde_json::Value;

use crate::actions::{EditorAction, KeyCombo, KeybindingConfig, KeydownResult};
use crate::editor::RichTextEditor;
use crate::error::EditError;
use crate::history::UndoManager;

/// Execute an editor action.
///
/// This is the central dispatch point for scripted and keyboard-driven
/// operations. Returns whether the document changed.
pub fn execute_action(editor: &mut RichTextEditor, action: &EditorAction) -> Result<bool, EditError> {
    tracing::trace!(target: "quire::editor", ?action, "execute");
    let changed = match action {
        EditorAction::Select { index, length } => {
            editor.select(*index, *length)?;
            false
        }
        EditorAction::Insert { text } => editor.insert_text(text)?,
        EditorAction::InsertParagraph => editor.insert_paragraph()?,
        EditorAction::InsertTab => editor.insert_tab()?,
        EditorAction::InsertNbsp => editor.insert_nbsp()?,
        EditorAction::InsertImage { url } => editor.insert_image(url)?,
        EditorAction::DeleteBackward => editor.delete_backward()?,
        EditorAction::DeleteForward => editor.delete_forward()?,
        EditorAction::Undo => editor.undo(),
        EditorAction::Redo => editor.redo(),
        EditorAction::Format { name, value } => {
            let revision = editor.revision();
            editor.format(name, value.clone())?;
            editor.revision() != revision
        }
        EditorAction::ToggleFormat { name } => {
            let active = editor
                .formats()
                .get(name.as_str())
                .is_some_and(|v| !quire_delta::is_removal(v));
            let revision = editor.revision();
            editor.format(name, Value::Bool(!active))?;
            editor.revision() != revision
        }
        EditorAction::ToolbarFormat { name, value } => {
            let revision = editor.revision();
            editor.toolbar_clicked(name, value.clone())?;
            editor.revision() != revision
        }
        EditorAction::ToggleReadonly => editor.toggle_readonly()?,
        EditorAction::SetValue { value } => {
            let revision = editor.revision();
            editor.set_value(value);
            editor.revision() != revision
        }
        EditorAction::SetTabStops { stops } => {
            if let Err(error) = editor.set_tab_stops(stops.clone()) {
                tracing::warn!(target: "quire::editor", %error, "rejected tab stop list");
            }
            false
        }
        EditorAction::AddTabStop { position } => {
            if let Err(error) = editor.add_tab_stop(*position) {
                tracing::warn!(target: "quire::editor", %error, "rejected tab stop");
            }
            false
        }
        EditorAction::CycleTabStop { index } => {
            editor.cycle_tab_stop(*index)?;
            false
        }
        EditorAction::Focus => {
            editor.focus();
            false
        }
        EditorAction::Blur => {
            editor.blur();
            false
        }
        EditorAction::Advance { millis } => {
            editor.advance(Duration::from_millis(*millis));
            false
        }
        EditorAction::RenderTick => {
            editor.render_tick();
            false
        }
        EditorAction::Copy => {
            let text = editor.copy_selection()?;
            tracing::debug!(target: "quire::editor", len = text.chars().count(), "copied selection");
            false
        }
    };
    Ok(changed)
}

/// Handle a keydown event using the keybinding configuration.
///
/// Only bound shortcuts are handled here. Navigation passes through, and
/// plain typing is left to the text input path.
pub fn handle_keydown(
    editor: &mut RichTextEditor,
    config: &KeybindingConfig,
    combo: &KeyCombo,
) -> KeydownResult {
    let Some(action) = config.lookup(combo) else {
        if combo.key.is_navigation() {
            return KeydownResult::PassThrough;
        }
        return KeydownResult::NotHandled;
    };
    if let Err(error) = execute_action(editor, action) {
        tracing::debug!(target: "quire::editor", %error, ?combo, "keybinding rejected");
    }
    KeydownResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Key, Modifiers};
    use crate::config::EditorConfig;

    fn editor() -> RichTextEditor {
        RichTextEditor::new(EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_toggle_format_flips() {
        let mut editor = editor();
        editor.set_value(r#"[{"insert":"word\n"}]"#);
        let select = EditorAction::Select { index: 0, length: 4 };
        let toggle = EditorAction::ToggleFormat { name: "bold".into() };
        execute_action(&mut editor, &select).unwrap();
        assert!(execute_action(&mut editor, &toggle).unwrap());
        assert_eq!(editor.protected_run_count(), 0);
        assert!(editor.delta().to_json().contains("bold"));
        assert!(execute_action(&mut editor, &toggle).unwrap());
        assert!(!editor.delta().to_json().contains("bold"));
    }

    #[test]
    fn test_shift_space_inserts_nbsp() {
        let mut editor = editor();
        let config = KeybindingConfig::default();
        let result = handle_keydown(&mut editor, &config, &KeyCombo::shift(Key::Space));
        assert_eq!(result, KeydownResult::Handled);
        assert_eq!(editor.delta().to_json(), r#"[{"insert":{"nbsp":true}},{"insert":"\n"}]"#);
    }

    #[test]
    fn test_navigation_passes_through() {
        let mut editor = editor();
        let config = KeybindingConfig::default();
        let combo = KeyCombo::with_modifiers(Key::ArrowLeft, Modifiers::NONE);
        assert_eq!(
            handle_keydown(&mut editor, &config, &combo),
            KeydownResult::PassThrough
        );
        assert_eq!(
            handle_keydown(&mut editor, &config, &KeyCombo::new(Key::character("q"))),
            KeydownResult::NotHandled
        );
    }
}
