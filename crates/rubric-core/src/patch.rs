//! Spans and rewrites: the out-of-band edit representation for autocorrection.
//!
//! The AST is never mutated. A correction is a [`Rewrite`] value (a byte
//! [`Span`] plus replacement text) computed from the original source; all
//! rewrites of one inspection pass are applied in a single linear scan by
//! [`apply_rewrites`].
//!
//! # Conflicts
//!
//! Rewrites must be pairwise disjoint. Adjacent rewrites (one ends where
//! the next starts) are fine. Two rewrites that share a byte, or that start
//! at the same offset, conflict and the whole batch is rejected with
//! [`PatchError::Conflict`]. Callers resolve conflicts by dropping one of
//! the rules or running the correction again on the corrected text.
//!
//! ```
//! use rubric_core::patch::{apply_rewrites, Rewrite, Span};
//!
//! let source = "puts x % [1, 2]";
//! let rewrites = vec![Rewrite::new(Span::new(5, 15), "format(x, 1, 2)")];
//! assert_eq!(apply_rewrites(source, &rewrites).unwrap(), "puts format(x, 1, 2)");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into source text.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn empty_at(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Two spans overlap if they share any byte positions.
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice `source` by this span.
    ///
    /// Returns `None` if the span is out of bounds or not on char boundaries.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Rewrite
// ============================================================================

/// A proposed textual replacement for one span of the original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    /// The byte range being replaced.
    pub span: Span,
    /// Text substituted for the span.
    pub replacement: String,
}

impl Rewrite {
    /// Create a rewrite replacing `span` with `replacement`.
    pub fn new(span: Span, replacement: impl Into<String>) -> Self {
        Rewrite {
            span,
            replacement: replacement.into(),
        }
    }

    /// Two rewrites conflict if their spans share a byte or start at the same offset.
    pub fn conflicts_with(&self, other: &Rewrite) -> bool {
        self.span.overlaps(&other.span) || self.span.start == other.span.start
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while applying a batch of rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// Two rewrites target overlapping spans.
    #[error("conflicting rewrites at {first} and {second}")]
    Conflict { first: Span, second: Span },

    /// A rewrite span extends beyond the source, or splits a UTF-8 character.
    #[error("rewrite span {span} is out of bounds for source of length {source_len}")]
    OutOfBounds { span: Span, source_len: usize },
}

/// Result type for rewrite application.
pub type PatchResult<T> = Result<T, PatchError>;

// ============================================================================
// Application
// ============================================================================

/// Sort rewrites by position, checking bounds and disjointness.
///
/// Returns references in ascending start order.
pub fn validate_rewrites<'r>(source: &str, rewrites: &'r [Rewrite]) -> PatchResult<Vec<&'r Rewrite>> {
    for rewrite in rewrites {
        if rewrite.span.slice(source).is_none() {
            return Err(PatchError::OutOfBounds {
                span: rewrite.span,
                source_len: source.len(),
            });
        }
    }

    let mut sorted: Vec<&Rewrite> = rewrites.iter().collect();
    sorted.sort_by_key(|r| (r.span.start, r.span.end));

    for pair in sorted.windows(2) {
        if pair[0].conflicts_with(pair[1]) {
            return Err(PatchError::Conflict {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    Ok(sorted)
}

/// Apply all rewrites to `source` in one pass.
///
/// The result is built by walking the sorted rewrites left to right, copying
/// untouched source between them verbatim and splicing each replacement.
///
/// # Errors
///
/// - [`PatchError::OutOfBounds`] if any span is outside `source`
/// - [`PatchError::Conflict`] if two rewrites overlap
pub fn apply_rewrites(source: &str, rewrites: &[Rewrite]) -> PatchResult<String> {
    let sorted = validate_rewrites(source, rewrites)?;

    let extra: usize = sorted.iter().map(|r| r.replacement.len()).sum();
    let mut result = String::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for rewrite in sorted {
        result.push_str(&source[cursor..rewrite.span.start]);
        result.push_str(&rewrite.replacement);
        cursor = rewrite.span.end;
    }
    result.push_str(&source[cursor..]);

    Ok(result)
}

/// Return every conflicting pair, not just the first.
pub fn find_conflicts(rewrites: &[Rewrite]) -> Vec<(Span, Span)> {
    let mut conflicts = Vec::new();
    for (i, a) in rewrites.iter().enumerate() {
        for b in &rewrites[i + 1..] {
            if a.conflicts_with(b) {
                let (first, second) = if a.span <= b.span {
                    (a.span, b.span)
                } else {
                    (b.span, a.span)
                };
                conflicts.push((first, second));
            }
        }
    }
    conflicts.sort();
    conflicts
}
