//! Core editor types: selection, change source, and placeholder glyphs.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Zero-width glyph that anchors the caret inside otherwise empty tab
/// markers and line fragments.
pub const PLACEHOLDER: char = '\u{FEFF}';

/// Selection in document units (embeds count as length 1).
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    /// Create a selection covering `length` units from `index`.
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// Create a collapsed selection (cursor position).
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    /// Build from two endpoints in either order.
    pub fn between(a: usize, b: usize) -> Self {
        Self {
            index: a.min(b),
            length: a.abs_diff(b),
        }
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Check if selection is collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.index && pos < self.end()
    }

    pub fn to_range(&self) -> Range<usize> {
        self.index..self.end()
    }

    /// Clamp into a document of `len` units.
    pub fn clamp(self, len: usize) -> Self {
        let index = self.index.min(len);
        Self {
            index,
            length: self.length.min(len - index),
        }
    }
}

/// Where a change came from.
///
/// Only `User` changes pass through the read-only guard. `Silent` changes
/// are not recorded in history.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Source {
    User,
    Api,
    Silent,
}

/// Whether the text is blank: only whitespace or placeholder glyphs.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c == PLACEHOLDER || c.is_whitespace())
}

pub fn strip_placeholders(text: &str) -> String {
    text.chars().filter(|&c| c != PLACEHOLDER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_between_orders_endpoints() {
        assert_eq!(Selection::between(7, 3), Selection::new(3, 4));
        assert!(Selection::caret(5).is_collapsed());
        assert!(Selection::new(2, 2).contains(3));
        assert!(!Selection::new(2, 2).contains(4));
    }

    #[test]
    fn test_selection_clamp() {
        assert_eq!(Selection::new(8, 4).clamp(10), Selection::new(8, 2));
        assert_eq!(Selection::new(12, 4).clamp(10), Selection::new(10, 0));
    }

    #[test]
    fn test_blank_text() {
        assert!(is_blank(" \u{FEFF} "));
        assert!(!is_blank(" x "));
        assert!(is_blank("\u{FEFF}\u{FEFF}"));
        assert!(is_blank(""));
        assert_eq!(strip_placeholders("\u{FEFF}ab\u{FEFF}"), "ab");
    }
}
