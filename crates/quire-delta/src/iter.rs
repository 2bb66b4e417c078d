//! Chunked iteration over a slice of ops.

use crate::op::{Insert, Op, OpKind};

/// Walks ops, handing out pieces of at most a requested length.
///
/// Once exhausted the iterator yields an infinite retain, which lets
/// composition treat the shorter delta as implicitly padded.
#[derive(Debug, Clone)]
pub struct OpIterator<'a> {
    ops: &'a [Op],
    index: usize,
    offset: usize,
}

impl<'a> OpIterator<'a> {
    pub fn new(ops: &'a [Op]) -> Self {
        Self {
            ops,
            index: 0,
            offset: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.peek_length() < usize::MAX
    }

    /// Remaining length of the current op, `usize::MAX` when exhausted.
    pub fn peek_length(&self) -> usize {
        match self.ops.get(self.index) {
            Some(op) => op.len() - self.offset,
            None => usize::MAX,
        }
    }

    pub fn peek_kind(&self) -> OpKind {
        match self.ops.get(self.index) {
            Some(op) => op.kind(),
            None => OpKind::Retain,
        }
    }

    pub fn peek(&self) -> Option<&'a Op> {
        self.ops.get(self.index)
    }

    /// Take up to `length` units from the current op.
    pub fn next_len(&mut self, length: usize) -> Op {
        let Some(op) = self.ops.get(self.index) else {
            return Op::Retain {
                len: usize::MAX,
                attributes: None,
            };
        };
        let offset = self.offset;
        let remaining = op.len() - offset;
        let length = if length >= remaining {
            self.index += 1;
            self.offset = 0;
            remaining
        } else {
            self.offset += length;
            length
        };
        match op {
            Op::Delete(_) => Op::Delete(length),
            Op::Retain { attributes, .. } => Op::Retain {
                len: length,
                attributes: attributes.clone(),
            },
            Op::Insert {
                content,
                attributes,
            } => {
                let content = match content {
                    Insert::Text(text) => {
                        Insert::Text(text.chars().skip(offset).take(length).collect())
                    }
                    Insert::Embed(embed) => Insert::Embed(embed.clone()),
                };
                Op::Insert {
                    content,
                    attributes: attributes.clone(),
                }
            }
        }
    }

    /// Everything not yet consumed, including the unread tail of the current op.
    pub fn rest(&mut self) -> Vec<Op> {
        if !self.has_next() {
            return Vec::new();
        }
        if self.offset == 0 {
            let rest = self.ops[self.index..].to_vec();
            self.index = self.ops.len();
            return rest;
        }
        let mut rest = vec![self.next_len(usize::MAX)];
        rest.extend_from_slice(&self.ops[self.index..]);
        self.index = self.ops.len();
        rest
    }
}

impl Iterator for OpIterator<'_> {
    type Item = Op;

    fn next(&mut self) -> Option<Op> {
        if self.has_next() {
            Some(self.next_len(usize::MAX))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Embed;

    #[test]
    fn test_splits_text_by_chars() {
        let ops = vec![Op::insert("héllo", None), Op::delete(3)];
        let mut iter = OpIterator::new(&ops);
        assert_eq!(iter.next_len(2), Op::insert("hé", None));
        assert_eq!(iter.peek_length(), 3);
        assert_eq!(iter.next_len(10), Op::insert("llo", None));
        assert_eq!(iter.peek_kind(), OpKind::Delete);
        assert_eq!(iter.next_len(1), Op::delete(1));
        assert_eq!(iter.rest(), vec![Op::delete(2)]);
        assert!(!iter.has_next());
        // Exhausted iterators pad with retain
        assert_eq!(iter.peek_kind(), OpKind::Retain);
        assert_eq!(iter.next_len(4).len(), usize::MAX);
    }

    #[test]
    fn test_embed_is_atomic() {
        let ops = vec![Op::insert(Embed::new("nbsp", true), None)];
        let mut iter = OpIterator::new(&ops);
        assert_eq!(iter.peek_length(), 1);
        assert!(iter.next_len(1).is_insert());
        assert!(iter.next().is_none());
    }
}
