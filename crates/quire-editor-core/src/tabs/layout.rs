//! Padding computation for line fragments.
//!
//! This is the measurement-dependent half of tab handling. It only touches
//! glyphs and padding, never structure, so it can run on a later render tick
//! without changing the serialized value.

use crate::measure::TextMeasure;
use crate::tabs::stops::{TabDirection, TabStop};
use crate::tree::{DocumentTree, Line, Node, TabGlyph};

/// Lay out every tab container in the tree.
pub fn layout(tree: &mut DocumentTree, stops: &[TabStop], measure: &dyn TextMeasure, content_inset: f32) {
    for line in tree.lines_mut() {
        if line.is_tab_container() {
            layout_line(line, stops, measure, content_inset);
        }
    }
}

/// Assign glyphs to tab markers and padding to the fragments after them.
///
/// Tabs count towards the stop index by their level, and only when something
/// follows them. A tab past the end of the stop list falls back to a literal
/// tab glyph and its fragment gets no offset. Negative padding is kept.
pub fn layout_line(line: &mut Line, stops: &[TabStop], measure: &dyn TextMeasure, content_inset: f32) {
    let mut x = 0.0_f32;
    let mut tab_number: usize = 0;
    let mut pending_stop: Option<TabStop> = None;
    let len = line.children.len();

    for i in 0..len {
        let has_next = i + 1 < len;
        match &mut line.children[i] {
            Node::Tab { level, glyph, .. } => {
                *glyph = TabGlyph::Placeholder;
                pending_stop = None;
                if has_next {
                    tab_number += *level as usize;
                    match stops.get(tab_number - 1) {
                        Some(stop) => pending_stop = Some(*stop),
                        None => *glyph = TabGlyph::LiteralTab,
                    }
                }
                tracing::trace!(
                    target: "quire::layout",
                    tab_number,
                    glyph = ?*glyph,
                    "tab marker"
                );
            }
            Node::Fragment { children, padding } => {
                let content: f32 = children.iter().map(|c| node_width(c, measure)).sum();
                *padding = match pending_stop.take() {
                    Some(stop) => {
                        let raw = stop.position - content_inset - x;
                        match stop.direction {
                            TabDirection::Left => raw,
                            TabDirection::Right => raw - content,
                            TabDirection::Middle => raw - content / 2.0,
                        }
                    }
                    None => 0.0,
                };
                tracing::trace!(target: "quire::layout", x, padding = *padding, "fragment");
            }
            _ => pending_stop = None,
        }
        x += node_width(&line.children[i], measure);
    }
}

/// Rendered width of a node including any fragment padding.
pub fn node_width(node: &Node, measure: &dyn TextMeasure) -> f32 {
    match node {
        Node::Text { text, attributes } => measure.text_width(text, attributes.as_ref()),
        Node::Embed { embed, .. } => measure.embed_width(embed),
        Node::ReadOnly { children, .. } => children.iter().map(|c| node_width(c, measure)).sum(),
        Node::Fragment { children, padding } => {
            padding + children.iter().map(|c| node_width(c, measure)).sum::<f32>()
        }
        Node::Tab { glyph, .. } => match glyph {
            TabGlyph::Placeholder => 0.0,
            TabGlyph::LiteralTab => measure.tab_width(),
        },
        Node::PendingTab { .. } => 0.0,
    }
}
