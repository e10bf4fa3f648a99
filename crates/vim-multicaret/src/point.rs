//! Virtual points and snapshot versions.
//!
//! A [`VirtualPoint`] addresses a character cell by logical line and column (in `char`s), plus a
//! count of virtual spaces for carets placed past the end of a line. Points are only meaningful
//! against the buffer snapshot they were captured from; see [`crate::translate`] for moving a
//! point from one snapshot to the next.

use std::fmt;

/// Identifies one immutable state of a text buffer.
///
/// Every mutation produces a new version. Points captured against version `k` must be translated
/// with [`crate::OffsetTranslator`] before they are used against version `k + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnapshotVersion(pub u64);

impl SnapshotVersion {
    /// The version that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A buffer coordinate that may extend into virtual space past the end of its line.
///
/// Ordering is lexicographic on `(line, column, virtual_spaces)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualPoint {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
    /// Virtual spaces past `column` (non-zero only when `column` is the end of the line).
    pub virtual_spaces: usize,
}

impl VirtualPoint {
    /// Create a point in real (non-virtual) space.
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            virtual_spaces: 0,
        }
    }

    /// Create a point with trailing virtual spaces.
    pub fn with_virtual_spaces(line: usize, column: usize, virtual_spaces: usize) -> Self {
        Self {
            line,
            column,
            virtual_spaces,
        }
    }

    /// Returns `true` if the point sits past the end of its line.
    pub fn is_in_virtual_space(&self) -> bool {
        self.virtual_spaces > 0
    }

    /// The same line at another column, in real space.
    pub fn with_column(self, column: usize) -> Self {
        Self::new(self.line, column)
    }

    /// Move by `delta` columns within the line (saturating at column 0).
    ///
    /// Pure column arithmetic: the result is not clamped against any buffer. Virtual spaces are
    /// dropped.
    pub fn offset_columns(self, delta: isize) -> Self {
        let column = if delta >= 0 {
            self.column.saturating_add(delta as usize)
        } else {
            self.column.saturating_sub(delta.unsigned_abs())
        };
        Self::new(self.line, column)
    }

    /// Column including virtual spaces.
    pub fn effective_column(&self) -> usize {
        self.column + self.virtual_spaces
    }
}

impl fmt::Display for VirtualPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.virtual_spaces > 0 {
            write!(f, "({}, {}+{})", self.line, self.column, self.virtual_spaces)
        } else {
            write!(f, "({}, {})", self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_line_column_virtual() {
        let a = VirtualPoint::new(0, 9);
        let b = VirtualPoint::new(1, 0);
        let c = VirtualPoint::with_virtual_spaces(1, 0, 2);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.max(c), c);
    }

    #[test]
    fn test_offset_columns_saturates() {
        let p = VirtualPoint::with_virtual_spaces(2, 3, 4);
        assert_eq!(p.offset_columns(2), VirtualPoint::new(2, 5));
        assert_eq!(p.offset_columns(-10), VirtualPoint::new(2, 0));
        assert_eq!(p.effective_column(), 7);
    }

    #[test]
    fn test_snapshot_version_next() {
        assert_eq!(SnapshotVersion(4).next(), SnapshotVersion(5));
        assert_eq!(SnapshotVersion(4).to_string(), "v4");
    }
}
