//! Editor actions and keybindings.
//!
//! `EditorAction` is the semantic vocabulary of the editing surface,
//! decoupled from how an operation is triggered. Actions deserialize from
//! JSON so a session can be scripted and replayed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::tabs::TabStop;

/// All possible editor actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    // === Selection ===
    Select {
        index: usize,
        #[serde(default)]
        length: usize,
    },

    // === Text insertion ===
    /// Type text over the selection.
    Insert { text: String },
    /// Enter.
    InsertParagraph,
    /// Tab: a pending tab marker when stops exist, else a literal tab.
    InsertTab,
    /// Shift+Space.
    InsertNbsp,
    InsertImage { url: String },

    // === Deletion ===
    DeleteBackward,
    DeleteForward,

    // === History ===
    Undo,
    Redo,

    // === Formatting ===
    /// Apply `name = value` to the selection.
    Format { name: SmolStr, value: Value },
    /// Flip a boolean inline format based on the formats at the selection.
    ToggleFormat { name: SmolStr },
    /// A format issued from a toolbar button.
    ToolbarFormat { name: SmolStr, value: Value },
    ToggleReadonly,

    // === Value and tab stops ===
    SetValue { value: String },
    SetTabStops { stops: Vec<TabStop> },
    AddTabStop { position: f32 },
    CycleTabStop { index: usize },

    // === Focus, time and rendering ===
    Focus,
    Blur,
    /// Let `millis` of virtual time pass.
    Advance { millis: u64 },
    RenderTick,
    /// Copy the selection (reported, not mutated).
    Copy,
}

/// Keys the editor binds. Anything else is `Character` or `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(SmolStr),
    Backspace,
    Delete,
    Enter,
    Tab,
    Space,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Other(SmolStr),
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft | Self::ArrowRight | Self::ArrowUp | Self::ArrowDown | Self::Home | Self::End
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META_SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        if is_mac { Self::META_SHIFT } else { Self::CTRL_SHIFT }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::SHIFT)
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary_shift(is_mac))
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Key combination to action table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self::default_for_platform(false)
    }
}

impl KeybindingConfig {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::empty();
        config.bind(KeyCombo::new(Key::Tab), EditorAction::InsertTab);
        config.bind(KeyCombo::shift(Key::Space), EditorAction::InsertNbsp);
        config.bind(KeyCombo::new(Key::Enter), EditorAction::InsertParagraph);
        config.bind(KeyCombo::new(Key::Backspace), EditorAction::DeleteBackward);
        config.bind(KeyCombo::new(Key::Delete), EditorAction::DeleteForward);
        config.bind(KeyCombo::primary(Key::character("z"), is_mac), EditorAction::Undo);
        config.bind(KeyCombo::primary_shift(Key::character("z"), is_mac), EditorAction::Redo);
        config.bind(KeyCombo::primary(Key::character("y"), is_mac), EditorAction::Redo);
        for (key, name) in [("b", "bold"), ("i", "italic"), ("u", "underline")] {
            config.bind(
                KeyCombo::primary(Key::character(key), is_mac),
                EditorAction::ToggleFormat { name: name.into() },
            );
        }
        config
    }

    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(combo, action);
    }

    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.remove(combo)
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&EditorAction> {
        self.bindings.get(combo)
    }
}
