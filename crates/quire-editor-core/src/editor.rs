//! RichTextEditor - the editing surface.
//!
//! Owns the operation log and everything derived from it. Every mutation
//! goes through one commit path:
//!
//! 1. pending layout continuations from the previous mutation run first
//! 2. the read-only guard checks user deletes against a log snapshot
//! 3. the accepted change is composed onto the log
//! 4. the tree is rebuilt (reusing unchanged lines) and tab-normalized, and
//!    the normalized tree is written back as the new log
//! 5. history records the step and the change pipeline is notified
//!
//! Measurement-dependent layout runs on the next [`RichTextEditor::render_tick`].
//! Value and HTML updates settle after the debounce window, driven by
//! [`RichTextEditor::advance`].

use std::time::Duration;

use quire_delta::{AttributeMap, Delta, Embed, Insert, Op, attributes};
use serde_json::Value;

use crate::config::EditorConfig;
use crate::error::{ConfigError, EditError, EditorDiagnostic, ValueError};
use crate::events::EditorEvent;
use crate::format::{self, FormatScope, BLOCK_FORMATS, STRUCTURAL};
use crate::guard::{self, GuardVerdict};
use crate::history::{History, HistoryEntry, UndoManager};
use crate::html::{HtmlProjection, render_html};
use crate::measure::TextMeasure;
use crate::pipeline::{ChangePipeline, Reaction};
use crate::registry::RegionRegistry;
use crate::tabs::{self, TabStop};
use crate::tree::DocumentTree;
use crate::types::{PLACEHOLDER, Selection, Source};

/// Serialized form of a document holding one empty line.
const EMPTY_DOCUMENT_JSON: &str = r#"[{"insert":"\n"}]"#;

/// Where keyboard focus sits relative to the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolbarState {
    #[default]
    Idle,
    /// Focus moved from the content to the toolbar.
    Focused,
    /// A toolbar command was issued and its value has not settled yet.
    Clicked,
}

/// How the selection is placed after a commit.
#[derive(Clone, Copy, Debug)]
enum CaretAfter {
    /// Map the previous selection through the applied change.
    Mapped,
    At(Selection),
    /// Just past a pending tab marker inserted at the index.
    PastMarker(usize),
}

pub struct RichTextEditor {
    config: EditorConfig,
    registry: RegionRegistry,
    measure: Box<dyn TextMeasure>,
    projection: HtmlProjection,

    log: Delta,
    tree: DocumentTree,
    revision: u64,
    selection: Selection,
    /// Formats set with a collapsed selection, applied to the next insert.
    cursor_formats: AttributeMap,
    tab_stops: Vec<TabStop>,
    history: History,
    pipeline: ChangePipeline,

    value: String,
    html: String,
    last_committed: String,

    focused: bool,
    toolbar: ToolbarState,
    disabled: bool,
    readonly: bool,

    events: Vec<EditorEvent>,
    diagnostics: Vec<EditorDiagnostic>,
}

impl std::fmt::Debug for RichTextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichTextEditor")
            .field("revision", &self.revision)
            .field("selection", &self.selection)
            .field("log", &self.log)
            .field("tab_stops", &self.tab_stops)
            .field("focused", &self.focused)
            .field("toolbar", &self.toolbar)
            .finish_non_exhaustive()
    }
}

impl RichTextEditor {
    /// Create an editor with the standard region registry.
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, RegionRegistry::standard())
    }

    pub fn with_registry(config: EditorConfig, registry: RegionRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        registry.validate()?;
        let measure = Box::new(config.measure());
        let projection = HtmlProjection::new(config.scope_classes.iter().cloned());
        let log = empty_document();
        let tree = DocumentTree::build(&registry, &log, None);
        let html = projection.project(&render_html(&tree));
        let mut editor = Self {
            registry,
            measure,
            projection,
            log,
            tree,
            revision: 0,
            selection: Selection::default(),
            cursor_formats: AttributeMap::new(),
            tab_stops: config.tab_stops.clone(),
            history: History::new(config.history_max_steps),
            pipeline: ChangePipeline::new(config.debounce_window()),
            value: String::new(),
            html,
            last_committed: String::new(),
            focused: false,
            toolbar: ToolbarState::Idle,
            disabled: false,
            readonly: false,
            events: Vec::new(),
            diagnostics: Vec::new(),
            config,
        };
        editor.tree.seal();
        Ok(editor)
    }

    /// Replace the width measurer used by tab layout.
    pub fn with_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    // === Accessors ===

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The external value: the serialized log, or `""` for an empty document.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The projected HTML as of the last settle.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn delta(&self) -> &Delta {
        &self.log
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Document length, trailing newline included.
    pub fn len(&self) -> usize {
        self.log.length()
    }

    /// Whether the document holds nothing but its trailing newline.
    pub fn is_empty(&self) -> bool {
        is_empty_document(&self.log)
    }

    pub fn tab_stops(&self) -> &[TabStop] {
        &self.tab_stops
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        self.toolbar
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn protected_run_count(&self) -> usize {
        guard::protected_run_count(&self.log)
    }

    /// Formats in effect at the selection, pending cursor formats included.
    pub fn formats(&self) -> AttributeMap {
        let mut formats = format::formats_at(&self.log, self.selection);
        for (key, value) in &self.cursor_formats {
            if attributes::is_removal(value) {
                formats.remove(key);
            } else {
                formats.insert(key.clone(), value.clone());
            }
        }
        formats
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain recoverable conditions reported since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<EditorDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // === External value ===

    /// Set the external value.
    ///
    /// `""`, `null` and the empty-document value clear the document. A value
    /// that is not a JSON array of insert operations leaves everything unchanged and
    /// reports [`EditorDiagnostic::InvalidValue`]. A value equal to the
    /// current log is a no-op apart from commit bookkeeping.
    pub fn set_value(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == EMPTY_DOCUMENT_JSON {
            self.clear();
            return;
        }

        let incoming = match Delta::from_json(trimmed).and_then(Delta::into_document) {
            Ok(delta) => with_trailing_newline(delta),
            Err(source) => {
                tracing::warn!(
                    target: "quire::value",
                    error = %source,
                    "invalid value set to editor, keeping last good value"
                );
                self.diagnostics.push(
                    ValueError {
                        source,
                        rejected: value.to_string(),
                    }
                    .into(),
                );
                return;
            }
        };

        if incoming != self.log {
            tracing::debug!(target: "quire::value", "replacing log from external value");
            self.install(incoming);
            self.history.clear();
            self.cursor_formats.clear();
            self.selection = self.selection.clamp(self.len().saturating_sub(1));
        }
        self.value = serialize(&self.log);
        self.pipeline.cancel_value();
        self.refresh_html();
        self.value_settled();
    }

    /// Empty the document without recording history.
    pub fn clear(&mut self) {
        self.install(empty_document());
        self.history.clear();
        self.cursor_formats.clear();
        self.selection = Selection::default();
        self.value = String::new();
        self.pipeline.cancel_value();
        self.refresh_html();
    }

    // === Tab stops ===

    /// Replace the tab stop list and re-run layout.
    pub fn set_tab_stops(&mut self, stops: Vec<TabStop>) -> Result<(), ConfigError> {
        tabs::validate(&stops)?;
        self.tab_stops = stops;
        self.relayout();
        Ok(())
    }

    /// Add a left stop at `position`, keeping the list ordered.
    pub fn add_tab_stop(&mut self, position: f32) -> Result<usize, ConfigError> {
        tabs::validate(&[TabStop::left(position)])?;
        let index = tabs::add_stop(&mut self.tab_stops, position);
        self.tab_stops_changed();
        Ok(index)
    }

    /// Cycle the stop at `index` through left, right, middle and removal.
    pub fn cycle_tab_stop(&mut self, index: usize) -> Result<Option<TabStop>, EditError> {
        if index >= self.tab_stops.len() {
            return Err(EditError::NoTabStop(index));
        }
        let stop = tabs::cycle_stop(&mut self.tab_stops, index);
        self.tab_stops_changed();
        Ok(stop)
    }

    fn tab_stops_changed(&mut self) {
        self.events
            .push(EditorEvent::TabStopsChanged(self.tab_stops.clone()));
        self.relayout();
    }

    /// Lay out against the new stops. The log is untouched, so the value
    /// debounce is left alone and only the projection is refreshed.
    fn relayout(&mut self) {
        tracing::debug!(target: "quire::layout", stops = self.tab_stops.len(), "tab stops changed");
        self.pipeline.request_layout(self.revision);
        self.refresh_html();
    }

    // === Focus and toolbar ===

    pub fn focus(&mut self) {
        self.focused = true;
        // A toolbar format that changed nothing leaves the state behind
        if self.toolbar == ToolbarState::Clicked {
            self.toolbar = ToolbarState::Idle;
        }
    }

    /// Focus leaves the content. Pending work is flushed and `Change` is
    /// emitted if the value moved since the last commit, unless focus went
    /// to the toolbar.
    pub fn blur(&mut self) {
        self.focused = false;
        if self.toolbar == ToolbarState::Focused {
            self.toolbar = ToolbarState::Idle;
            return;
        }
        self.emit_change();
        if self.pipeline.flush_html() {
            self.refresh_html();
        }
    }

    /// Keyboard focus moved into the toolbar.
    pub fn focus_toolbar(&mut self) {
        self.toolbar = ToolbarState::Focused;
    }

    /// A toolbar button issued `format(name, value)`. The `Change` event
    /// follows as soon as the value settles.
    pub fn toolbar_clicked(&mut self, name: &str, value: Value) -> Result<(), EditError> {
        self.toolbar = ToolbarState::Clicked;
        self.format(name, value)
    }

    // === Modes ===

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    fn ensure_editable(&self) -> Result<(), EditError> {
        if self.disabled {
            Err(EditError::Disabled)
        } else if self.readonly {
            Err(EditError::ReadOnly)
        } else {
            Ok(())
        }
    }

    // === Selection ===

    pub fn select(&mut self, index: usize, length: usize) -> Result<(), EditError> {
        let len = self.len();
        if index + length > len {
            return Err(EditError::OutOfBounds {
                index: index + length,
                len,
            });
        }
        self.selection = Selection::new(index, length);
        self.cursor_formats.clear();
        Ok(())
    }

    /// Plain text of the selection. Permitted in read-only mode.
    pub fn copy_selection(&self) -> Result<String, EditError> {
        if self.disabled {
            return Err(EditError::Disabled);
        }
        Ok(plain_text(
            &self.log.slice(self.selection.index, self.selection.end()),
        ))
    }

    // === Editing ===

    /// Type `text` over the selection.
    pub fn insert_text(&mut self, text: &str) -> Result<bool, EditError> {
        self.ensure_editable()?;
        if text.is_empty() && self.selection.is_collapsed() {
            return Ok(false);
        }
        let attrs = self.typing_formats();
        let sel = self.selection;
        let mut change = Delta::new();
        change
            .retain(sel.index, None)
            .insert(text, attrs)
            .delete(sel.length);
        Ok(self.commit(change, Source::User, CaretAfter::Mapped))
    }

    /// Split the line at the selection. The new line keeps the line formats.
    pub fn insert_paragraph(&mut self) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let sel = self.selection;
        let line_formats = format::formats_at(&self.log, Selection::caret(sel.index))
            .into_iter()
            .filter(|(key, _)| BLOCK_FORMATS.contains(&key.as_str()))
            .collect::<AttributeMap>();
        let mut change = Delta::new();
        change
            .retain(sel.index, None)
            .insert("\n", attributes::non_empty(line_formats))
            .delete(sel.length);
        Ok(self.commit(change, Source::User, CaretAfter::Mapped))
    }

    /// Backspace.
    pub fn delete_backward(&mut self) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let sel = self.selection;
        if !sel.is_collapsed() {
            return self.delete_range(sel);
        }
        if sel.index == 0 {
            return Ok(false);
        }
        self.delete_range(Selection::new(sel.index - 1, 1))
    }

    /// Delete key.
    pub fn delete_forward(&mut self) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let sel = self.selection;
        if !sel.is_collapsed() {
            return self.delete_range(sel);
        }
        self.delete_range(Selection::new(sel.index, 1))
    }

    /// Delete `range`. The trailing newline of the document is never deleted.
    pub fn delete_range(&mut self, range: Selection) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let last = self.len().saturating_sub(1);
        if range.index > last {
            return Err(EditError::OutOfBounds {
                index: range.index,
                len: self.len(),
            });
        }
        let end = range.end().min(last);
        if end <= range.index {
            return Ok(false);
        }
        self.selection = Selection::caret(end);
        let mut change = Delta::new();
        change.retain(range.index, None).delete(end - range.index);
        Ok(self.commit(change, Source::User, CaretAfter::Mapped))
    }

    /// Apply an arbitrary user-originated change.
    pub fn apply_user_delta(&mut self, change: &Delta) -> Result<bool, EditError> {
        self.ensure_editable()?;
        self.check_base_length(change)?;
        Ok(self.commit(change.clone(), Source::User, CaretAfter::Mapped))
    }

    /// Apply a programmatic change. Not subject to the editable flags, and
    /// only `User` changes pass the read-only guard.
    pub fn update_contents(&mut self, change: &Delta, source: Source) -> Result<bool, EditError> {
        self.check_base_length(change)?;
        Ok(self.commit(change.clone(), source, CaretAfter::Mapped))
    }

    fn check_base_length(&self, change: &Delta) -> Result<(), EditError> {
        let base: usize = change
            .ops()
            .iter()
            .filter(|op| !op.is_insert())
            .map(Op::len)
            .sum();
        let len = self.len();
        if base > len {
            return Err(EditError::OutOfBounds { index: base, len });
        }
        Ok(())
    }

    /// Tab key. With tab stops configured this inserts a pending tab marker
    /// and turns the line into a tab container; without, a literal tab.
    pub fn insert_tab(&mut self) -> Result<bool, EditError> {
        self.ensure_editable()?;
        if self.tab_stops.is_empty() {
            return self.insert_text("\t");
        }
        let sel = self.selection;
        let mut insert = Delta::new();
        insert
            .retain(sel.index, None)
            .insert(
                PLACEHOLDER.to_string(),
                Some(AttributeMap::from([("pre-tab".into(), Value::Bool(true))])),
            )
            .delete(sel.length);
        let inserted = self.log.compose(&insert);
        let container = format::block_change(
            &inserted,
            Selection::caret(sel.index),
            "tabs-cont",
            Value::Bool(true),
        );
        let change = insert.compose(&container);
        Ok(self.commit(change, Source::User, CaretAfter::PastMarker(sel.index)))
    }

    /// Shift+Space: a non-breaking space at the caret.
    pub fn insert_nbsp(&mut self) -> Result<bool, EditError> {
        self.insert_embed(Embed::new("nbsp", true))
    }

    /// Insert an image. The host owns the upload; this only places the URL.
    pub fn insert_image(&mut self, url: &str) -> Result<bool, EditError> {
        self.insert_embed(Embed::new("image", url))
    }

    fn insert_embed(&mut self, embed: Embed) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let sel = self.selection;
        let mut change = Delta::new();
        change
            .retain(sel.index, None)
            .insert_embed(embed, None)
            .delete(sel.length);
        Ok(self.commit(change, Source::User, CaretAfter::Mapped))
    }

    // === Formatting ===

    /// `format(name, value)` over the selection. `null` or `false` removes.
    ///
    /// An inline format on a collapsed selection is held as a cursor format
    /// for the next insert.
    pub fn format(&mut self, name: &str, value: Value) -> Result<(), EditError> {
        self.ensure_editable()?;
        let scope = format::scope(name).ok_or_else(|| EditError::UnknownFormat(name.into()))?;
        let sel = self.selection;
        if scope == FormatScope::Inline && sel.is_collapsed() {
            self.cursor_formats.insert(name.into(), value);
            return Ok(());
        }
        let change = format::format_change(&self.log, sel, name, &value)?;
        self.commit(change, Source::User, CaretAfter::At(sel));
        Ok(())
    }

    /// Wrap the selection in a read-only span, or unwrap it if the selection
    /// starts inside one. A collapsed selection does nothing.
    pub fn toggle_readonly(&mut self) -> Result<bool, EditError> {
        self.ensure_editable()?;
        let sel = self.selection;
        if sel.is_collapsed() {
            return Ok(false);
        }
        let existing = format::formats_at(&self.log, Selection::new(sel.index, 1))
            .get("readonly")
            .is_some_and(|v| !attributes::is_removal(v));
        self.format("readonly", Value::Bool(!existing))?;
        Ok(true)
    }

    fn typing_formats(&self) -> Option<AttributeMap> {
        let mut attrs: AttributeMap = format::formats_at(&self.log, Selection::caret(self.selection.index))
            .into_iter()
            .filter(|(key, _)| {
                !BLOCK_FORMATS.contains(&key.as_str()) && !STRUCTURAL.contains(&key.as_str())
            })
            .collect();
        for (key, value) in &self.cursor_formats {
            if attributes::is_removal(value) {
                attrs.remove(key);
            } else {
                attrs.insert(key.clone(), value.clone());
            }
        }
        attributes::non_empty(attrs)
    }

    // === Commit path ===

    /// Check, apply and record one change. Returns whether the log changed.
    fn commit(&mut self, change: Delta, source: Source, caret: CaretAfter) -> bool {
        self.render_tick();
        let before = self.log.clone();
        let selection_before = self.selection;

        let (change, after) = match guard::check(&before, &change, source) {
            GuardVerdict::Accept { change, after } => (change, after),
            GuardVerdict::Revert {
                before: count_before,
                after: count_after,
                restore,
            } => {
                self.selection = restore.clamp(self.len().saturating_sub(1));
                self.diagnostics.push(EditorDiagnostic::GuardRollback {
                    before: count_before,
                    after: count_after,
                    restored: self.selection,
                });
                return false;
            }
        };

        let staged = with_trailing_newline(after);
        let staged_len = staged.length();
        self.install(staged);
        if self.log == before {
            tracing::trace!(target: "quire::editor", "change left the log unchanged");
        }

        let selection = match caret {
            CaretAfter::Mapped => Selection::between(
                change.transform_position(selection_before.index, false),
                change.transform_position(selection_before.end(), false),
            ),
            CaretAfter::At(selection) => selection,
            // A marker merged into the preceding tab leaves no glyph behind
            CaretAfter::PastMarker(index) if self.len() < staged_len => Selection::caret(index),
            CaretAfter::PastMarker(index) => Selection::caret(index + 1),
        };
        self.selection = selection.clamp(self.len().saturating_sub(1));
        if change.ops().iter().any(Op::is_insert) {
            self.cursor_formats.clear();
        }

        if source != Source::Silent {
            self.history.record(HistoryEntry {
                before: before.clone(),
                after: self.log.clone(),
                selection_before,
                selection_after: self.selection,
            });
        }
        tracing::debug!(
            target: "quire::editor",
            ?source,
            revision = self.revision,
            len = self.len(),
            "committed change"
        );
        self.log != before
    }

    /// Rebuild the tree from `log`, normalize it and adopt its serialization.
    fn install(&mut self, log: Delta) {
        let mut tree = DocumentTree::build(&self.registry, &log, Some(&self.tree));
        tabs::normalize(&mut tree, &self.registry);
        let normalized = tree.to_delta();
        if normalized != log {
            tracing::trace!(target: "quire::editor", %normalized, "normalization rewrote the log");
        }
        tree.seal();
        self.tree = tree;
        self.log = normalized;
        self.revision += 1;
        self.pipeline.on_mutation(self.revision);
    }

    // === Change pipeline ===

    /// Move the virtual clock forward, settling whatever came due.
    pub fn advance(&mut self, elapsed: Duration) {
        for reaction in self.pipeline.advance(elapsed) {
            match reaction {
                Reaction::SerializeValue => {
                    self.settle_value();
                    self.value_settled();
                }
                Reaction::ProjectHtml => self.refresh_html(),
            }
        }
    }

    /// Run the layout continuation queued by the latest mutation.
    pub fn render_tick(&mut self) {
        if self.pipeline.take_layout(self.revision) {
            tabs::layout(
                &mut self.tree,
                &self.tab_stops,
                self.measure.as_ref(),
                self.config.content_inset,
            );
        }
    }

    /// Settle every pending debounced reaction now.
    pub fn flush(&mut self) {
        if self.pipeline.flush_value() {
            self.settle_value();
            self.value_settled();
        }
        if self.pipeline.flush_html() {
            self.refresh_html();
        }
    }

    fn settle_value(&mut self) {
        let value = serialize(&self.log);
        if value != self.value {
            tracing::debug!(target: "quire::pipeline", len = value.len(), "value settled");
            self.value = value.clone();
            self.events.push(EditorEvent::ValueChanged(value));
        }
    }

    /// Bookkeeping after the value property changed, by a settle or a set.
    fn value_settled(&mut self) {
        if self.toolbar == ToolbarState::Clicked {
            self.toolbar = ToolbarState::Idle;
            self.emit_change();
        } else if !self.focused {
            // Changed from outside the editing surface
            self.last_committed = self.value.clone();
        }
    }

    fn refresh_html(&mut self) {
        self.render_tick();
        let html = self.projection.project(&render_html(&self.tree));
        if html != self.html {
            self.html = html.clone();
            self.events.push(EditorEvent::HtmlChanged(html));
        }
    }

    fn emit_change(&mut self) {
        if self.pipeline.flush_value() {
            self.settle_value();
        }
        if self.last_committed != self.value {
            self.last_committed = self.value.clone();
            tracing::debug!(target: "quire::editor", "change committed");
            self.events.push(EditorEvent::Change {
                value: self.value.clone(),
            });
        }
    }
}

impl UndoManager for RichTextEditor {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        if self.disabled || self.readonly {
            return false;
        }
        let Some((log, selection)) = self.history.take_undo() else {
            return false;
        };
        self.restore(log, selection);
        true
    }

    fn redo(&mut self) -> bool {
        if self.disabled || self.readonly {
            return false;
        }
        let Some((log, selection)) = self.history.take_redo() else {
            return false;
        };
        self.restore(log, selection);
        true
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl RichTextEditor {
    fn restore(&mut self, log: Delta, selection: Selection) {
        self.render_tick();
        self.install(log);
        self.selection = selection.clamp(self.len().saturating_sub(1));
        self.cursor_formats.clear();
    }
}

fn empty_document() -> Delta {
    Delta::from_ops([Op::insert("\n", None)])
}

fn is_empty_document(log: &Delta) -> bool {
    match log.ops() {
        [] => true,
        [Op::Insert { content, attributes }] => {
            content.as_text() == Some("\n") && attributes.is_none()
        }
        _ => false,
    }
}

/// The external value for a log.
pub fn serialize(log: &Delta) -> String {
    if is_empty_document(log) {
        String::new()
    } else {
        log.to_json()
    }
}

/// Make sure the document ends with a newline.
pub fn with_trailing_newline(mut delta: Delta) -> Delta {
    let ends_with_newline = matches!(
        delta.ops().last(),
        Some(Op::Insert { content: Insert::Text(text), .. }) if text.ends_with('\n')
    );
    if !ends_with_newline {
        delta.insert("\n", None);
    }
    delta
}

/// Text of a document slice. Non-breaking spaces become `U+00A0`, other
/// embeds and placeholder glyphs are dropped.
pub fn plain_text(delta: &Delta) -> String {
    let mut out = String::new();
    for op in delta.ops() {
        if let Op::Insert { content, .. } = op {
            match content {
                Insert::Text(text) => out.extend(text.chars().filter(|&c| c != PLACEHOLDER)),
                Insert::Embed(embed) if embed.kind.as_str() == "nbsp" => out.push('\u{a0}'),
                Insert::Embed(_) => {}
            }
        }
    }
    out
}
