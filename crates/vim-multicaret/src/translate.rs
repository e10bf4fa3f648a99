//! Translating positions across a text change.
//!
//! A [`TextChange`] describes one replacement in character offsets and in point space. The
//! [`OffsetTranslator`] is the only way to move an offset, a point or a span from the snapshot
//! before a change to the snapshot after it:
//!
//! - positions before the changed region are unaffected,
//! - positions inside a removed region collapse to the start of the change,
//! - positions after the changed region shift by the length delta.
//!
//! A position exactly at the start of a pure insertion stays where it is, unless it is translated
//! with one of the `_after` methods, which move it past the inserted text. The broadcaster uses
//! those for carets it has not run yet: carets run in ascending order, so text inserted at such a
//! caret always belongs before the character under it.

use crate::point::{SnapshotVersion, VirtualPoint};
use crate::span::SelectedSpan;

/// One replacement applied to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    /// Start character offset.
    pub start: usize,
    /// Number of characters removed.
    pub removed_len: usize,
    /// Number of characters inserted.
    pub inserted_len: usize,
    /// Start of the change as a point (same in both snapshots).
    pub start_point: VirtualPoint,
    /// End of the removed region in the old snapshot.
    pub old_end: VirtualPoint,
    /// End of the inserted region in the new snapshot.
    pub new_end: VirtualPoint,
    /// Snapshot the change was applied to.
    pub before: SnapshotVersion,
    /// Snapshot the change produced.
    pub after: SnapshotVersion,
}

impl TextChange {
    /// Exclusive end offset of the removed region (old snapshot).
    pub fn old_end_offset(&self) -> usize {
        self.start + self.removed_len
    }

    /// Exclusive end offset of the inserted region (new snapshot).
    pub fn new_end_offset(&self) -> usize {
        self.start + self.inserted_len
    }

    /// Signed change in buffer length.
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.removed_len as isize
    }

    /// Returns `true` if nothing was removed or inserted.
    pub fn is_empty(&self) -> bool {
        self.removed_len == 0 && self.inserted_len == 0
    }
}

/// Maps positions across one [`TextChange`].
#[derive(Debug, Clone, Copy)]
pub struct OffsetTranslator {
    change: TextChange,
}

impl OffsetTranslator {
    /// Create a translator for `change`.
    pub fn new(change: TextChange) -> Self {
        Self { change }
    }

    /// The change being translated across.
    pub fn change(&self) -> &TextChange {
        &self.change
    }

    /// Translate a character offset.
    pub fn translate_offset(&self, offset: usize) -> usize {
        self.offset(offset, false)
    }

    /// Translate a character offset, moving it past text inserted exactly at it.
    pub fn translate_offset_after(&self, offset: usize) -> usize {
        self.offset(offset, true)
    }

    /// Translate a point. Virtual spaces are kept for points that only shift.
    pub fn translate_point(&self, point: VirtualPoint) -> VirtualPoint {
        self.point(point, false)
    }

    /// Translate a point, moving it past text inserted exactly at it.
    pub fn translate_point_after(&self, point: VirtualPoint) -> VirtualPoint {
        self.point(point, true)
    }

    /// Translate every point of a span.
    pub fn translate_span(&self, span: SelectedSpan) -> SelectedSpan {
        span.map_points(|point| self.point(point, false))
    }

    /// Translate every point of a span, moving points past text inserted exactly at them.
    pub fn translate_span_after(&self, span: SelectedSpan) -> SelectedSpan {
        span.map_points(|point| self.point(point, true))
    }

    fn stays_at_insertion(&self, at_start: bool, after: bool) -> bool {
        at_start && self.change.removed_len == 0 && !after
    }

    fn offset(&self, offset: usize, after: bool) -> usize {
        let change = &self.change;
        if offset < change.start || self.stays_at_insertion(offset == change.start, after) {
            offset
        } else if offset < change.old_end_offset() {
            change.start
        } else {
            offset - change.removed_len + change.inserted_len
        }
    }

    fn point(&self, point: VirtualPoint, after: bool) -> VirtualPoint {
        let change = &self.change;
        let real = VirtualPoint::new(point.line, point.column);
        let start = change.start_point;

        if real < start || self.stays_at_insertion(real == start, after) {
            return point;
        }
        if real < change.old_end {
            return start;
        }

        if point.line == change.old_end.line {
            VirtualPoint::with_virtual_spaces(
                change.new_end.line,
                change.new_end.column + (point.column - change.old_end.column),
                point.virtual_spaces,
            )
        } else {
            let line = point.line - change.old_end.line + change.new_end.line;
            VirtualPoint::with_virtual_spaces(line, point.column, point.virtual_spaces)
        }
    }
}
