//! Format commands: turning `format(name, value)` into a change delta.

use quire_delta::{AttributeMap, Delta, Insert, Op, attributes};
use serde_json::Value;

use crate::error::EditError;
use crate::registry::RegionKind;
use crate::types::Selection;

/// Formats carried by text runs.
pub const INLINE_FORMATS: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "strike",
    "code",
    "link",
    "script",
    "readonly",
];

/// Formats carried by a line's terminating newline.
pub const BLOCK_FORMATS: &[&str] = &[
    "header",
    "list",
    "blockquote",
    "code-block",
    "align",
    "indent",
    "direction",
    "tabs-cont",
];

/// Block formats that replace each other: a line is at most one of these.
pub const EXCLUSIVE_BLOCKS: &[&str] = &["header", "list", "blockquote", "code-block", "tabs-cont"];

/// Attributes `clean` leaves alone.
pub const STRUCTURAL: &[&str] = &["readonly", "tab", "pre-tab", "tabs-cont"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatScope {
    Inline,
    Block,
    Clean,
}

/// Classify a format name.
pub fn scope(name: &str) -> Option<FormatScope> {
    if name == "clean" {
        Some(FormatScope::Clean)
    } else if INLINE_FORMATS.contains(&name) {
        Some(FormatScope::Inline)
    } else if BLOCK_FORMATS.contains(&name) {
        Some(FormatScope::Block)
    } else {
        None
    }
}

/// Build the change applying `name = value` over `selection` of `document`.
///
/// A removal value (`null` or `false`) clears the format.
pub fn format_change(
    document: &Delta,
    selection: Selection,
    name: &str,
    value: &Value,
) -> Result<Delta, EditError> {
    let scope = scope(name).ok_or_else(|| EditError::UnknownFormat(name.into()))?;
    let len = document.length();
    if selection.end() > len {
        return Err(EditError::OutOfBounds {
            index: selection.end(),
            len,
        });
    }
    let value = if attributes::is_removal(value) {
        Value::Null
    } else {
        value.clone()
    };
    let change = match scope {
        FormatScope::Inline => inline_change(document, selection, name, value),
        FormatScope::Block => block_change(document, selection, name, value),
        FormatScope::Clean => clean_change(document, selection),
    };
    tracing::trace!(target: "quire::format", name, ?selection, %change, "format change");
    Ok(change)
}

fn single(name: &str, value: Value) -> AttributeMap {
    AttributeMap::from([(name.into(), value)])
}

/// Retain over the selection with `name = value`, skipping newlines and
/// fixed tab-stop embeds.
pub fn inline_change(document: &Delta, selection: Selection, name: &str, value: Value) -> Delta {
    let attrs = single(name, value);
    let mut change = Delta::new();
    change.retain(selection.index, None);
    for op in document.slice(selection.index, selection.end()).ops() {
        let Op::Insert { content, .. } = op else {
            continue;
        };
        match content {
            Insert::Text(text) => {
                for (i, segment) in text.split('\n').enumerate() {
                    if i > 0 {
                        change.retain(1, None);
                    }
                    change.retain(segment.chars().count(), Some(attrs.clone()));
                }
            }
            Insert::Embed(embed) if RegionKind::for_embed(&embed.kind) == RegionKind::FixedTabStop => {
                change.retain(1, None);
            }
            Insert::Embed(_) => {
                change.retain(1, Some(attrs.clone()));
            }
        }
    }
    change.chop();
    change
}

/// Newline positions of `document`, each with the start of its line.
pub fn line_bounds(document: &Delta) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut pos = 0;
    let mut line_start = 0;
    for op in document.ops() {
        match op {
            Op::Insert {
                content: Insert::Text(text),
                ..
            } => {
                for ch in text.chars() {
                    if ch == '\n' {
                        bounds.push((line_start, pos));
                        line_start = pos + 1;
                    }
                    pos += 1;
                }
            }
            Op::Insert {
                content: Insert::Embed(embed),
                ..
            } => {
                pos += 1;
                if RegionKind::for_embed(&embed.kind) == RegionKind::FixedTabStop {
                    line_start = pos;
                }
            }
            _ => {}
        }
    }
    bounds
}

/// Newline positions of every line the selection touches.
pub fn selected_newlines(document: &Delta, selection: Selection) -> Vec<usize> {
    line_bounds(document)
        .into_iter()
        .filter(|&(start, newline)| {
            newline >= selection.index && (start < selection.end() || start <= selection.index)
        })
        .map(|(_, newline)| newline)
        .collect()
}

/// Set a block format on every selected line.
pub fn block_change(document: &Delta, selection: Selection, name: &str, value: Value) -> Delta {
    let mut attrs = AttributeMap::new();
    if EXCLUSIVE_BLOCKS.contains(&name) && !value.is_null() {
        for other in EXCLUSIVE_BLOCKS.iter().filter(|other| **other != name) {
            attrs.insert((*other).into(), Value::Null);
        }
    }
    attrs.insert(name.into(), value);
    newline_change(&selected_newlines(document, selection), &attrs)
}

/// A change retaining each newline in `newlines` with `attrs`.
pub fn newline_change(newlines: &[usize], attrs: &AttributeMap) -> Delta {
    let mut change = Delta::new();
    let mut pos = 0;
    for &newline in newlines {
        change.retain(newline - pos, None);
        change.retain(1, Some(attrs.clone()));
        pos = newline + 1;
    }
    change
}

/// Remove formatting over the selection, keeping read-only and tab structure.
pub fn clean_change(document: &Delta, selection: Selection) -> Delta {
    let mut change = Delta::new();
    change.retain(selection.index, None);
    for op in document.slice(selection.index, selection.end()).ops() {
        let Op::Insert {
            content,
            attributes,
        } = op
        else {
            continue;
        };
        let removal = clearing(attributes.as_ref());
        match content {
            Insert::Text(text) => {
                for (i, segment) in text.split('\n').enumerate() {
                    if i > 0 {
                        change.retain(1, removal.clone());
                    }
                    change.retain(segment.chars().count(), removal.clone());
                }
            }
            Insert::Embed(_) => {
                change.retain(1, removal.clone());
            }
        }
    }
    change.chop();
    change
}

fn clearing(attrs: Option<&AttributeMap>) -> Option<AttributeMap> {
    let attrs = attrs?;
    attributes::non_empty(
        attrs
            .keys()
            .filter(|key| !STRUCTURAL.contains(&key.as_str()))
            .map(|key| (key.clone(), Value::Null))
            .collect(),
    )
}

/// Formats in effect for a selection: inline formats shared by every
/// selected run (or of the run before a caret) plus the formats of the
/// first selected line.
pub fn formats_at(document: &Delta, selection: Selection) -> AttributeMap {
    let inline_span = if selection.is_collapsed() {
        document.slice(selection.index.saturating_sub(1), selection.index)
    } else {
        document.slice(selection.index, selection.end())
    };
    let mut common: Option<AttributeMap> = None;
    for op in inline_span.ops() {
        let Op::Insert {
            content,
            attributes,
        } = op
        else {
            continue;
        };
        if content.as_text() == Some("\n") {
            continue;
        }
        let attrs = attributes.clone().unwrap_or_default();
        common = Some(match common {
            None => attrs,
            Some(prev) => prev
                .into_iter()
                .filter(|(key, value)| attrs.get(key) == Some(value))
                .collect(),
        });
    }
    let mut formats = common.unwrap_or_default();
    formats.retain(|key, _| !BLOCK_FORMATS.contains(&key.as_str()));

    if let Some(&(_, newline)) = line_bounds(document)
        .iter()
        .find(|(_, newline)| *newline >= selection.index)
    {
        let newline_op = document.slice(newline, newline + 1);
        if let Some(attrs) = newline_op.ops().first().and_then(Op::attributes) {
            formats.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    formats
}
