//! Half-open line ranges and the bisection rule.

use std::fmt;

/// A non-empty half-open interval `[start, end)` of 0-based line indices.
///
/// Empty ranges cannot be constructed, so every range that reaches the
/// work list holds at least one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// Create `[start, end)`, or `None` when it would hold no lines.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// The range covering a whole buffer of `len` lines.
    #[must_use]
    pub fn full(len: usize) -> Option<Self> {
        Self::new(0, len)
    }

    /// The single-line range `[index, index + 1)`.
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index + 1,
        }
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of lines in the range (always at least 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// A minimal range holds exactly one line and cannot be split.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        self.len() == 1
    }

    /// Bisect a failing range.
    ///
    /// Returns `None` for a minimal range, otherwise `[upper, lower]` where
    /// the split point is `start + len / 2` (floor). Pushing both onto a LIFO
    /// work list in this order explores the lower half first. The lower half
    /// holds `floor(len / 2)` lines and the upper half `ceil(len / 2)`.
    #[must_use]
    pub fn split(&self) -> Option<[LineRange; 2]> {
        if self.is_minimal() {
            return None;
        }
        let mid = self.start + self.len() / 2;
        Some([
            LineRange {
                start: mid,
                end: self.end,
            },
            LineRange {
                start: self.start,
                end: mid,
            },
        ])
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
