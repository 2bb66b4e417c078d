//! The operation log.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{self, AttributeMap};
use crate::error::DeltaError;
use crate::iter::OpIterator;
use crate::op::{Embed, Insert, Op, OpKind};

/// An ordered, canonical sequence of operations.
///
/// Ops pushed through [`Delta::push`] are merged with their neighbour when
/// they share attributes, so two deltas describing the same content compare
/// equal structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a canonical delta from arbitrary ops.
    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        let mut delta = Self::new();
        for op in ops {
            delta.push(op);
        }
        delta
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> OpIterator<'_> {
        OpIterator::new(&self.ops)
    }

    pub fn insert(&mut self, text: impl Into<String>, attributes: Option<AttributeMap>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.push(Op::insert(text, attributes));
        }
        self
    }

    pub fn insert_embed(&mut self, embed: Embed, attributes: Option<AttributeMap>) -> &mut Self {
        self.push(Op::insert(embed, attributes))
    }

    pub fn delete(&mut self, len: usize) -> &mut Self {
        if len > 0 {
            self.push(Op::delete(len));
        }
        self
    }

    pub fn retain(&mut self, len: usize, attributes: Option<AttributeMap>) -> &mut Self {
        if len > 0 {
            self.push(Op::retain(len, attributes));
        }
        self
    }

    /// Append an op, merging with the previous one where possible.
    ///
    /// An insert directly after a delete is placed before it, so
    /// "delete then insert" and "insert then delete" canonicalise the same way.
    pub fn push(&mut self, op: Op) -> &mut Self {
        if op.is_empty() {
            return self;
        }
        let mut index = self.ops.len();
        if let Some(last) = self.ops.last_mut() {
            if let (Op::Delete(prev), Op::Delete(len)) = (&mut *last, &op) {
                *prev += len;
                return self;
            }
            if last.is_delete() && op.is_insert() {
                index -= 1;
                if index == 0 {
                    self.ops.insert(0, op);
                    return self;
                }
            }
        }
        if index > 0 {
            let prev = &mut self.ops[index - 1];
            if prev.attributes() == op.attributes() {
                match (prev, &op) {
                    (
                        Op::Insert {
                            content: Insert::Text(prev),
                            ..
                        },
                        Op::Insert {
                            content: Insert::Text(text),
                            ..
                        },
                    ) => {
                        prev.push_str(text);
                        return self;
                    }
                    (Op::Retain { len: prev, .. }, Op::Retain { len, .. }) => {
                        *prev += len;
                        return self;
                    }
                    _ => {}
                }
            }
        }
        if index == self.ops.len() {
            self.ops.push(op);
        } else {
            self.ops.insert(index, op);
        }
        self
    }

    /// Drop a trailing unattributed retain, which carries no information.
    pub fn chop(&mut self) -> &mut Self {
        if let Some(Op::Retain {
            attributes: None, ..
        }) = self.ops.last()
        {
            self.ops.pop();
        }
        self
    }

    /// Total length of inserts and retains.
    pub fn length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_delete())
            .map(Op::len)
            .sum()
    }

    /// Whether the delta removes any content.
    pub fn has_delete(&self) -> bool {
        self.ops.iter().any(Op::is_delete)
    }

    /// Whether every op is an insert, as in a full document.
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Op::is_insert)
    }

    /// Apply `other` on top of `self`, producing a single equivalent delta.
    pub fn compose(&self, other: &Delta) -> Delta {
        let mut this_iter = self.iter();
        let mut other_iter = other.iter();
        let mut delta = Delta::new();
        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek_kind() == OpKind::Insert {
                delta.push(other_iter.next_len(usize::MAX));
                continue;
            }
            if this_iter.peek_kind() == OpKind::Delete {
                delta.push(this_iter.next_len(usize::MAX));
                continue;
            }
            let length = this_iter.peek_length().min(other_iter.peek_length());
            let this_op = this_iter.next_len(length);
            let other_op = other_iter.next_len(length);
            match other_op {
                Op::Retain {
                    attributes: other_attrs,
                    ..
                } => {
                    let op = match this_op {
                        Op::Retain { attributes, .. } => Op::Retain {
                            len: length,
                            attributes: attributes::compose(
                                attributes.as_ref(),
                                other_attrs.as_ref(),
                                true,
                            ),
                        },
                        Op::Insert {
                            content,
                            attributes,
                        } => Op::Insert {
                            content,
                            attributes: attributes::compose(
                                attributes.as_ref(),
                                other_attrs.as_ref(),
                                false,
                            ),
                        },
                        Op::Delete(_) => continue,
                    };
                    delta.push(op);
                }
                Op::Delete(len) => {
                    // Deleting freshly inserted content cancels out
                    if this_op.is_retain() {
                        delta.push(Op::Delete(len));
                    }
                }
                Op::Insert { .. } => {}
            }
        }
        delta.chop();
        delta
    }

    /// The ops covering document positions `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Delta {
        let mut delta = Delta::new();
        let mut iter = self.iter();
        let mut index = 0;
        while index < end && iter.has_next() {
            let op = if index < start {
                iter.next_len(start - index)
            } else {
                let op = iter.next_len(end - index);
                delta.push(op.clone());
                op
            };
            index += op.len();
        }
        delta
    }

    /// Append `other`, merging at the seam.
    pub fn concat(&self, other: &Delta) -> Delta {
        let mut delta = self.clone();
        for op in other.ops.iter().cloned() {
            delta.push(op);
        }
        delta
    }

    /// Shift a document position through this delta.
    ///
    /// With `priority` an insert exactly at `index` does not move it.
    pub fn transform_position(&self, mut index: usize, priority: bool) -> usize {
        let mut offset = 0;
        for op in &self.ops {
            if offset > index {
                break;
            }
            let len = op.len();
            match op {
                Op::Delete(_) => {
                    index -= len.min(index - offset);
                    continue;
                }
                Op::Insert { .. } if offset < index || !priority => index += len,
                _ => {}
            }
            offset += len;
        }
        index
    }

    /// Split a document delta into lines, each paired with the attributes of
    /// its terminating newline.
    ///
    /// Trailing content without a newline forms a final line with no
    /// attributes. Non-insert ops end the walk.
    pub fn lines(&self) -> Vec<(Delta, Option<AttributeMap>)> {
        let mut lines = Vec::new();
        let mut line = Delta::new();
        for op in &self.ops {
            let Op::Insert {
                content,
                attributes,
            } = op
            else {
                break;
            };
            match content {
                Insert::Text(text) => {
                    let mut rest = text.as_str();
                    while let Some(at) = rest.find('\n') {
                        line.insert(&rest[..at], attributes.clone());
                        lines.push((std::mem::take(&mut line), attributes.clone()));
                        rest = &rest[at + 1..];
                    }
                    line.insert(rest, attributes.clone());
                }
                Insert::Embed(_) => {
                    line.push(op.clone());
                }
            }
        }
        if !line.is_empty() {
            lines.push((line, None));
        }
        lines
    }

    /// Parse the serialized form.
    pub fn from_json(input: &str) -> Result<Self, DeltaError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DeltaError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(DeltaError::NotAnArray {
                    found: json_kind(&other),
                });
            }
        };
        let mut delta = Delta::new();
        for (index, item) in items.into_iter().enumerate() {
            let op: Op = serde_json::from_value(item).map_err(|e| DeltaError::InvalidOp {
                index,
                reason: e.to_string(),
            })?;
            delta.push(op);
        }
        Ok(delta)
    }

    /// Check that the delta is a full document: inserts only.
    pub fn into_document(self) -> Result<Self, DeltaError> {
        if self.is_document() {
            return Ok(self);
        }
        let mut offending = self.ops.iter().enumerate().filter(|(_, op)| !op.is_insert());
        match offending.next() {
            Some((index, op)) => Err(DeltaError::NotADocument {
                index,
                kind: if op.kind() == OpKind::Delete { "delete" } else { "retain" },
            }),
            None => Ok(self),
        }
    }

    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromIterator<Op> for Delta {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        Delta::from_ops(iter)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(v: Value) -> Option<AttributeMap> {
        Some(serde_json::from_value(v).unwrap())
    }

    #[test]
    fn test_push_merges_runs() {
        let mut delta = Delta::new();
        delta.insert("Hel", None).insert("lo", None).insert("!", attrs(json!({"bold": true})));
        assert_eq!(delta.ops().len(), 2);
        assert_eq!(delta.to_json(), r#"[{"insert":"Hello"},{"insert":"!","attributes":{"bold":true}}]"#);
    }

    #[test]
    fn test_insert_goes_before_delete() {
        let mut a = Delta::new();
        a.retain(2, None).delete(3).insert("x", None);
        let mut b = Delta::new();
        b.retain(2, None).insert("x", None).delete(3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_insert_then_format() {
        let base = Delta::from_json(r#"[{"insert":"Hello World\n"}]"#).unwrap();
        let mut change = Delta::new();
        change.retain(6, None).retain(5, attrs(json!({"bold": true})));
        let out = base.compose(&change);
        assert_eq!(
            out.to_json(),
            r#"[{"insert":"Hello "},{"insert":"World","attributes":{"bold":true}},{"insert":"\n"}]"#
        );
    }

    #[test]
    fn test_compose_delete_cancels_insert() {
        let base = Delta::from_json(r#"[{"insert":"abc\n"}]"#).unwrap();
        let mut change = Delta::new();
        change.retain(1, None).delete(1);
        assert_eq!(base.compose(&change).to_json(), r#"[{"insert":"ac\n"}]"#);
    }

    #[test]
    fn test_compose_removal_unformats() {
        let base = Delta::from_json(r#"[{"insert":"ab","attributes":{"readonly":true}},{"insert":"\n"}]"#)
            .unwrap();
        let mut change = Delta::new();
        change.retain(2, attrs(json!({"readonly": false})));
        assert_eq!(base.compose(&change).to_json(), r#"[{"insert":"ab\n"}]"#);
    }

    #[test]
    fn test_slice_and_length() {
        let delta = Delta::from_json(r#"[{"insert":"ab"},{"insert":{"image":"x"}},{"insert":"cd\n"}]"#)
            .unwrap();
        assert_eq!(delta.length(), 6);
        let slice = delta.slice(1, 4);
        assert_eq!(slice.to_json(), r#"[{"insert":"b"},{"insert":{"image":"x"}},{"insert":"c"}]"#);
    }

    #[test]
    fn test_transform_position() {
        let mut change = Delta::new();
        change.retain(2, None).insert("xyz", None);
        assert_eq!(change.transform_position(4, false), 7);
        assert_eq!(change.transform_position(1, false), 1);
        let mut change = Delta::new();
        change.retain(1, None).delete(2);
        assert_eq!(change.transform_position(5, false), 3);
        assert_eq!(change.transform_position(2, false), 1);
    }

    #[test]
    fn test_lines() {
        let delta = Delta::from_json(
            r#"[{"insert":"one\ntwo"},{"insert":"\n","attributes":{"header":1}},{"insert":"\n"}]"#,
        )
        .unwrap();
        let lines = delta.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0.to_json(), r#"[{"insert":"one"}]"#);
        assert!(lines[0].1.is_none());
        assert_eq!(lines[1].1, attrs(json!({"header": 1})));
        assert!(lines[2].0.is_empty());
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            Delta::from_json(r#"{"insert":"x"}"#),
            Err(DeltaError::NotAnArray { found: "an object" })
        ));
        assert!(matches!(Delta::from_json("[{"), Err(DeltaError::Json(_))));
        let err = Delta::from_json(r#"[{"insert":"a"},{"retain":0}]"#).unwrap_err();
        assert!(matches!(err, DeltaError::InvalidOp { index: 1, .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let input = r#"[{"insert":"secret","attributes":{"readonly":true}},{"insert":{"nbsp":true}},{"insert":"\n","attributes":{"align":"center"}}]"#;
        let delta = Delta::from_json(input).unwrap();
        assert_eq!(delta.to_json(), input);
        assert_eq!(Delta::from_json(&delta.to_json()).unwrap(), delta);
    }

    #[test]
    fn test_into_document_rejects_changes() {
        let doc = Delta::from_json(r#"[{"insert":"abc\n"}]"#).unwrap();
        assert_eq!(doc.clone().into_document().unwrap(), doc);

        let change = Delta::from_json(r#"[{"insert":"a"},{"delete":3}]"#).unwrap();
        assert!(matches!(
            change.into_document(),
            Err(DeltaError::NotADocument { index: 1, kind: "delete" })
        ));
        let change = Delta::from_json(r#"[{"retain":2,"attributes":{"bold":true}}]"#).unwrap();
        assert!(matches!(
            change.into_document(),
            Err(DeltaError::NotADocument { index: 0, kind: "retain" })
        ));
    }
}
