//! quire-editor-core: rich-text editing core over a delta operation log.
//!
//! This crate provides:
//! - `RegionRegistry` - the custom region kinds and their nesting rules
//! - `DocumentTree` - structural view materialized from the log
//! - `tabs` - tab normalization and tab-stop layout
//! - `guard` - the read-only guard for user deletes
//! - `ChangePipeline` - debounced value and HTML settling
//! - `RichTextEditor` - the editing surface tying them together
//! - HTML writer and projection, format commands, actions and keybindings

pub mod actions;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod execute;
pub mod format;
pub mod guard;
pub mod history;
pub mod html;
pub mod measure;
pub mod pipeline;
pub mod registry;
pub mod tabs;
pub mod tree;
pub mod types;

pub use actions::{EditorAction, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers};
pub use config::EditorConfig;
pub use editor::{RichTextEditor, ToolbarState, plain_text, serialize};
pub use error::{ConfigError, EditError, EditorDiagnostic, ValueError};
pub use events::EditorEvent;
pub use execute::{execute_action, handle_keydown};
pub use format::{FormatScope, format_change, formats_at};
pub use guard::{GuardVerdict, protected_run_count};
pub use history::{History, HistoryEntry, UndoManager};
pub use html::{EMPTY_DOCUMENT_HTML, HtmlProjection, project, render_html, write_html_fmt};
pub use measure::{MonospaceMeasure, TextMeasure};
pub use pipeline::{ChangePipeline, Debouncer, Reaction};
pub use quire_delta::{AttributeMap, Delta, Embed, Op};
pub use registry::{RegionKind, RegionRegistry, RegionSpec, StructuralRole};
pub use smol_str::SmolStr;
pub use tabs::{TabDirection, TabStop};
pub use tree::{BlockNode, DocumentTree, Line, Node, TabGlyph};
pub use types::{PLACEHOLDER, Selection, Source};
