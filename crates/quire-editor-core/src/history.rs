//! Undo/redo history for the operation log.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History` - bounded snapshot stacks of the log and selection
//!
//! Entries are whole-log snapshots. Edits are small and the log is already
//! snapshotted for the read-only guard, so a diff would buy little.

use quire_delta::Delta;

use crate::types::Selection;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub before: Delta,
    pub after: Delta,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record a committed change. No-op when the log did not change.
    pub fn record(&mut self, entry: HistoryEntry) {
        if entry.before == entry.after {
            return;
        }
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(entry);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the latest change, moving it to the redo stack.
    pub fn take_undo(&mut self) -> Option<(Delta, Selection)> {
        let entry = self.undo_stack.pop()?;
        let restore = (entry.before.clone(), entry.selection_before);
        self.redo_stack.push(entry);
        Some(restore)
    }

    /// Pop the latest undone change, moving it back to the undo stack.
    pub fn take_redo(&mut self) -> Option<(Delta, Selection)> {
        let entry = self.redo_stack.pop()?;
        let restore = (entry.after.clone(), entry.selection_after);
        self.undo_stack.push(entry);
        Some(restore)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Delta {
        let mut d = Delta::new();
        d.insert(text, None);
        d
    }

    fn entry(before: &str, after: &str) -> HistoryEntry {
        HistoryEntry {
            before: doc(before),
            after: doc(after),
            selection_before: Selection::caret(0),
            selection_after: Selection::caret(after.len()),
        }
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(10);
        history.record(entry("\n", "a\n"));
        history.record(entry("a\n", "ab\n"));
        assert_eq!(history.take_undo().unwrap().0, doc("a\n"));
        assert!(history.can_redo());
        assert_eq!(history.take_redo().unwrap().0, doc("ab\n"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new(10);
        history.record(entry("\n", "a\n"));
        history.take_undo();
        history.record(entry("\n", "b\n"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_steps_evicts_oldest() {
        let mut history = History::new(2);
        history.record(entry("\n", "a\n"));
        history.record(entry("a\n", "ab\n"));
        history.record(entry("ab\n", "abc\n"));
        assert_eq!(history.undo_len(), 2);
        history.take_undo();
        assert_eq!(history.take_undo().unwrap().0, doc("a\n"));
        assert!(history.take_undo().is_none());
    }

    #[test]
    fn test_noop_change_is_not_recorded() {
        let mut history = History::new(10);
        history.record(entry("a\n", "a\n"));
        assert!(!history.can_undo());
    }
}
