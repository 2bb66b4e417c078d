//! Single operations and their JSON shape.
//!
//! On the wire an operation is an object carrying exactly one of `insert`,
//! `delete` or `retain`, plus optional `attributes`:
//!
//! ```json
//! [{"insert": "Hello"}, {"insert": {"image": "a.png"}}, {"retain": 3, "attributes": {"bold": true}}]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::attributes::{AttributeMap, non_empty};
use crate::error::OpShapeError;

/// Inserted content: a run of text or a single embed token.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

/// An embed token such as an image or a fixed tab stop.
///
/// Serialized as a single-entry object `{kind: value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub kind: SmolStr,
    pub value: Value,
}

impl Embed {
    pub fn new(kind: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl Insert {
    /// Length in document units.
    pub fn len(&self) -> usize {
        match self {
            Insert::Text(text) => text.chars().count(),
            Insert::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Insert::Text(text) => Some(text),
            Insert::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Insert::Embed(embed) => Some(embed),
            Insert::Text(_) => None,
        }
    }

    fn from_value(value: Value) -> Result<Self, OpShapeError> {
        match value {
            Value::String(text) => Ok(Insert::Text(text)),
            Value::Object(map) if map.len() == 1 => {
                let Some((kind, value)) = map.into_iter().next() else {
                    return Err(OpShapeError::BadInsert);
                };
                Ok(Insert::Embed(Embed::new(kind, value)))
            }
            _ => Err(OpShapeError::BadInsert),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Insert::Text(text) => Value::String(text),
            Insert::Embed(embed) => {
                let mut map = Map::new();
                map.insert(embed.kind.to_string(), embed.value);
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for Insert {
    fn from(text: &str) -> Self {
        Insert::Text(text.to_string())
    }
}

impl From<String> for Insert {
    fn from(text: String) -> Self {
        Insert::Text(text)
    }
}

impl From<Embed> for Insert {
    fn from(embed: Embed) -> Self {
        Insert::Embed(embed)
    }
}

/// Discriminant of an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Delete,
    Retain,
}

/// A single operation in a [`Delta`](crate::Delta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOp", into = "RawOp")]
pub enum Op {
    Insert {
        content: Insert,
        attributes: Option<AttributeMap>,
    },
    Delete(usize),
    Retain {
        len: usize,
        attributes: Option<AttributeMap>,
    },
}

impl Op {
    pub fn insert(content: impl Into<Insert>, attributes: Option<AttributeMap>) -> Self {
        Op::Insert {
            content: content.into(),
            attributes: attributes.and_then(non_empty),
        }
    }

    pub fn retain(len: usize, attributes: Option<AttributeMap>) -> Self {
        Op::Retain {
            len,
            attributes: attributes.and_then(non_empty),
        }
    }

    pub fn delete(len: usize) -> Self {
        Op::Delete(len)
    }

    /// Length in document units.
    pub fn len(&self) -> usize {
        match self {
            Op::Insert { content, .. } => content.len(),
            Op::Delete(len) => *len,
            Op::Retain { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Op::Insert { .. } => OpKind::Insert,
            Op::Delete(_) => OpKind::Delete,
            Op::Retain { .. } => OpKind::Retain,
        }
    }

    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => attributes.as_ref(),
            Op::Delete(_) => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete(_))
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct RawOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delete: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retain: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
}

impl TryFrom<RawOp> for Op {
    type Error = OpShapeError;

    fn try_from(raw: RawOp) -> Result<Self, Self::Error> {
        let attributes = raw.attributes.and_then(non_empty);
        match (raw.insert, raw.delete, raw.retain) {
            (Some(insert), None, None) => {
                let content = Insert::from_value(insert)?;
                if content.is_empty() {
                    return Err(OpShapeError::ZeroLength("insert"));
                }
                Ok(Op::Insert {
                    content,
                    attributes,
                })
            }
            (None, Some(len), None) => {
                if len == 0 {
                    return Err(OpShapeError::ZeroLength("delete"));
                }
                if attributes.is_some() {
                    return Err(OpShapeError::AttributedDelete);
                }
                Ok(Op::Delete(len))
            }
            (None, None, Some(len)) => {
                if len == 0 {
                    return Err(OpShapeError::ZeroLength("retain"));
                }
                Ok(Op::Retain { len, attributes })
            }
            (None, None, None) => Err(OpShapeError::Empty),
            (Some(_), Some(_), _) => Err(OpShapeError::Mixed("insert", "delete")),
            (Some(_), None, Some(_)) => Err(OpShapeError::Mixed("insert", "retain")),
            (None, Some(_), Some(_)) => Err(OpShapeError::Mixed("delete", "retain")),
        }
    }
}

impl From<Op> for RawOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Insert {
                content,
                attributes,
            } => RawOp {
                insert: Some(content.into_value()),
                delete: None,
                retain: None,
                attributes,
            },
            Op::Delete(len) => RawOp {
                insert: None,
                delete: Some(len),
                retain: None,
                attributes: None,
            },
            Op::Retain { len, attributes } => RawOp {
                insert: None,
                delete: None,
                retain: Some(len),
                attributes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_length_counts_chars() {
        let op = Op::insert("héllo", None);
        assert_eq!(op.len(), 5);
        let op = Op::insert(Embed::new("image", "a.png"), None);
        assert_eq!(op.len(), 1);
    }

    #[test]
    fn test_embed_wire_shape() {
        let op = Op::insert(Embed::new("tabstop", "A"), None);
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value, json!({"insert": {"tabstop": "A"}}));
        let back: Op = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_empty_attributes_are_dropped() {
        let op: Op = serde_json::from_value(json!({"retain": 2, "attributes": {}})).unwrap();
        assert_eq!(op, Op::retain(2, None));
    }

    #[test]
    fn test_rejects_malformed_ops() {
        let cases = [
            json!({}),
            json!({"insert": "a", "delete": 1}),
            json!({"retain": 0}),
            json!({"insert": ""}),
            json!({"insert": 5}),
            json!({"insert": {"image": "a", "video": "b"}}),
            json!({"delete": 1, "attributes": {"bold": true}}),
        ];
        for case in cases {
            assert!(
                serde_json::from_value::<Op>(case.clone()).is_err(),
                "accepted {case}"
            );
        }
    }
}
