use std::cmp::Ordering;

use crate::error::{Error, Result};

/// A markup span over a text, in code point offsets.
///
/// `open` is written before the covered text and `close` after it, both
/// verbatim. A zero-width annotation (`start == end`) marks an insertion
/// point. When two annotations cover exactly the same span, the one with the
/// lower `priority` is rendered inside the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub start: i64,
    pub end: i64,
    pub open: Vec<u8>,
    pub close: Vec<u8>,
    pub priority: i32,
}

impl Annotation {
    pub fn new(start: i64, end: i64, open: impl Into<Vec<u8>>, close: impl Into<Vec<u8>>) -> Self {
        Annotation {
            start,
            end,
            open: open.into(),
            close: close.into(),
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_zero_width(&self) -> bool {
        self.start == self.end
    }
}

/// Orders annotations by start, then wider spans first so they open first
/// and close last, then higher priority first so the lower one nests inside.
pub fn nesting_order(a: &Annotation, b: &Annotation) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.end.cmp(&a.end))
        .then_with(|| b.priority.cmp(&a.priority))
}

/// Sorts references to `annotations` by [`nesting_order`]. The sort is
/// stable, so annotations with equal keys keep their input order.
pub fn normalize(annotations: &[Annotation]) -> Vec<&Annotation> {
    let mut sorted: Vec<&Annotation> = annotations.iter().collect();
    sorted.sort_by(|a, b| nesting_order(a, b));
    sorted
}

/// Checks every annotation against a text of `len` code points and reports
/// the first defective one in input order.
pub fn validate(annotations: &[Annotation], len: usize) -> Result<()> {
    let limit = i64::try_from(len).unwrap_or(i64::MAX);
    for (index, a) in annotations.iter().enumerate() {
        if a.start < 0 {
            return Err(Error::InvalidStart {
                index,
                start: a.start,
            });
        }
        if a.end < a.start || a.end > limit {
            return Err(Error::UnclosedRange {
                index,
                start: a.start,
                end: a.end,
                len,
            });
        }
    }
    Ok(())
}
