//! Read-only guard.
//!
//! User edits that delete content are checked against the protected-run
//! count of the document. A protected span is atomic with respect to its
//! boundary: a delete that crosses into or out of it is widened to cover the
//! whole span, the way a non-editable island behaves on screen. If the edit
//! would change the protected-run count it is refused and the log keeps its
//! pre-edit snapshot.
//!
//! Deletes that stay strictly inside a span are not widened, so the content
//! of a protected span can still be truncated as long as some of it remains.

use std::ops::Range;

use quire_delta::{Delta, Op, attributes};

use crate::types::{Selection, Source};

/// Outcome of checking one change.
#[derive(Clone, Debug, PartialEq)]
pub enum GuardVerdict {
    /// Apply `change` (possibly widened) to get `after`.
    Accept { change: Delta, after: Delta },
    /// Keep the pre-edit log and move the caret to `restore`.
    Revert {
        before: usize,
        after: usize,
        restore: Selection,
    },
}

/// Number of protected runs: inserts flagged `readonly`, or `readonly` embeds.
pub fn protected_run_count(delta: &Delta) -> usize {
    delta.ops().iter().filter(|op| is_protected(op)).count()
}

fn is_protected(op: &Op) -> bool {
    match op {
        Op::Insert {
            content,
            attributes,
        } => {
            attributes::is_set(attributes.as_ref(), "readonly")
                || content.as_embed().is_some_and(|e| e.kind.as_str() == "readonly")
        }
        _ => false,
    }
}

/// Document ranges covered by protected content, adjacent runs merged.
pub fn protected_spans(document: &Delta) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut pos = 0;
    for op in document.ops() {
        let len = op.len();
        if is_protected(op) {
            match spans.last_mut() {
                Some(span) if span.end == pos => span.end += len,
                _ => spans.push(pos..pos + len),
            }
        }
        pos += len;
    }
    spans
}

/// Ranges a change deletes, in pre-edit coordinates.
pub fn delete_ranges(change: &Delta) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    for op in change.ops() {
        match op {
            Op::Retain { len, .. } => pos += len,
            Op::Delete(len) => {
                ranges.push(pos..pos + len);
                pos += len;
            }
            Op::Insert { .. } => {}
        }
    }
    ranges
}

/// Check a change against the document it applies to.
pub fn check(before: &Delta, change: &Delta, source: Source) -> GuardVerdict {
    if source != Source::User || !change.has_delete() {
        return GuardVerdict::Accept {
            change: change.clone(),
            after: before.compose(change),
        };
    }
    let count_before = protected_run_count(before);
    if count_before == 0 {
        return GuardVerdict::Accept {
            change: change.clone(),
            after: before.compose(change),
        };
    }

    let widened = widen(before, change);
    let after = before.compose(&widened);
    let count_after = protected_run_count(&after);
    if count_after != count_before {
        let start = delete_ranges(change).first().map_or(0, |r| r.start);
        let last = before.length().saturating_sub(1);
        let restore = Selection::caret((start + 1).min(last));
        tracing::warn!(
            target: "quire::guard",
            before = count_before,
            after = count_after,
            caret = restore.index,
            "reverting edit that removes a read-only section"
        );
        return GuardVerdict::Revert {
            before: count_before,
            after: count_after,
            restore,
        };
    }
    if widened != *change {
        tracing::debug!(target: "quire::guard", "delete widened to protected span boundary");
    }
    GuardVerdict::Accept {
        change: widened,
        after,
    }
}

/// Extend deletes that partially overlap a protected span to cover it.
pub fn widen(document: &Delta, change: &Delta) -> Delta {
    let spans = protected_spans(document);
    let mut deletes = delete_ranges(change);
    let mut touched = false;
    for delete in &mut deletes {
        for span in &spans {
            let overlaps = delete.start < span.end && delete.end > span.start;
            let inside = span.start <= delete.start && delete.end <= span.end;
            let covers = delete.start <= span.start && span.end <= delete.end;
            if overlaps && !inside && !covers {
                delete.start = delete.start.min(span.start);
                delete.end = delete.end.max(span.end);
                touched = true;
            }
        }
    }
    if !touched {
        return change.clone();
    }
    rebuild(change, &merge(deletes))
}

fn merge(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Re-express `change` so every range in `deletes` is deleted.
fn rebuild(change: &Delta, deletes: &[Range<usize>]) -> Delta {
    let mut out = Delta::new();
    let mut pos = 0;
    for op in change.ops() {
        match op {
            Op::Insert { .. } => {
                out.push(op.clone());
            }
            Op::Delete(len) => {
                out.delete(*len);
                pos += len;
            }
            Op::Retain { len, attributes } => {
                let end = pos + len;
                let mut cursor = pos;
                while cursor < end {
                    match deletes.iter().find(|d| d.start < end && d.end > cursor) {
                        Some(d) if d.start <= cursor => {
                            let stop = d.end.min(end);
                            out.delete(stop - cursor);
                            cursor = stop;
                        }
                        Some(d) => {
                            out.retain(d.start - cursor, attributes.clone());
                            cursor = d.start;
                        }
                        None => {
                            out.retain(end - cursor, attributes.clone());
                            cursor = end;
                        }
                    }
                }
                pos = end;
            }
        }
    }
    for d in deletes {
        if d.end <= pos {
            continue;
        }
        if d.start > pos {
            out.retain(d.start - pos, None);
        }
        out.delete(d.end - d.start.max(pos));
        pos = d.end;
    }
    out.chop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Delta {
        Delta::from_json(
            r#"[{"insert":"abc "},{"insert":"secret","attributes":{"readonly":true}},{"insert":" xyz\n"}]"#,
        )
        .unwrap()
    }

    fn deletion(at: usize, len: usize) -> Delta {
        let mut change = Delta::new();
        change.retain(at, None).delete(len);
        change
    }

    #[test]
    fn test_counts_protected_runs() {
        assert_eq!(protected_run_count(&doc()), 1);
        assert_eq!(protected_spans(&doc()), vec![4..10]);
    }

    #[test]
    fn test_delete_across_start_boundary_reverts() {
        let verdict = check(&doc(), &deletion(2, 4), Source::User);
        assert_eq!(
            verdict,
            GuardVerdict::Revert {
                before: 1,
                after: 0,
                restore: Selection::caret(3),
            }
        );
    }

    #[test]
    fn test_delete_of_whole_span_reverts() {
        let verdict = check(&doc(), &deletion(4, 6), Source::User);
        assert!(matches!(verdict, GuardVerdict::Revert { .. }));
    }

    #[test]
    fn test_delete_inside_span_truncates() {
        let verdict = check(&doc(), &deletion(5, 2), Source::User);
        let GuardVerdict::Accept { after, .. } = verdict else {
            panic!("expected edit to be accepted");
        };
        assert_eq!(protected_run_count(&after), 1);
        assert_eq!(
            after.to_json(),
            r#"[{"insert":"abc "},{"insert":"sret","attributes":{"readonly":true}},{"insert":" xyz\n"}]"#
        );
    }

    #[test]
    fn test_unrelated_delete_is_accepted() {
        let verdict = check(&doc(), &deletion(11, 2), Source::User);
        let GuardVerdict::Accept { change, after } = verdict else {
            panic!("expected edit to be accepted");
        };
        assert_eq!(change, deletion(11, 2));
        assert_eq!(protected_run_count(&after), 1);
    }

    #[test]
    fn test_api_changes_bypass_guard() {
        let verdict = check(&doc(), &deletion(4, 6), Source::Api);
        assert!(matches!(verdict, GuardVerdict::Accept { .. }));
    }

    #[test]
    fn test_widen_rebuilds_change() {
        let mut change = Delta::new();
        change.retain(2, None).delete(4).insert("Z", None);
        let widened = widen(&doc(), &change);
        let mut expected = Delta::new();
        expected.retain(2, None).insert("Z", None).delete(8);
        assert_eq!(widened, expected);
    }

    #[test]
    fn test_widen_past_change_end() {
        // Delete ending inside the span with no trailing retain
        let widened = widen(&doc(), &deletion(8, 4));
        assert_eq!(widened, deletion(4, 8));
    }
}
