//! Versioned text buffers.
//!
//! [`TextBuffer`] is the addressing and mutation interface the execution engine works against.
//! [`RopeBuffer`] implements it on top of a [`ropey::Rope`] and carries the linked-transaction undo
//! history used by the broadcaster.

use crate::error::BufferError;
use crate::point::{SnapshotVersion, VirtualPoint};
use crate::span::SelectedSpan;
use crate::text::split_lines_preserve_trailing;
use crate::translate::TextChange;
use crate::undo::{TextEdit, TransactionHandle, UndoHistory, UndoStack};
use ropey::Rope;
use tracing::trace;

/// Line and offset addressing plus replacement over a versioned snapshot.
///
/// Offsets and columns count `char`s. Lines do not include their line break.
pub trait TextBuffer {
    /// Current snapshot version.
    fn version(&self) -> SnapshotVersion;

    /// Number of lines (a trailing line break starts an empty last line).
    fn line_count(&self) -> usize;

    /// Length of `line` in characters, or 0 for a line past the end.
    fn line_len(&self, line: usize) -> usize;

    /// Text of `line` without its line break, or an empty string past the end.
    fn line_text(&self, line: usize) -> String;

    /// Total number of characters.
    fn char_count(&self) -> usize;

    /// Offset of `point`, clamped to the buffer. Virtual spaces are ignored.
    fn point_to_offset(&self, point: VirtualPoint) -> usize;

    /// Point at `offset`.
    fn offset_to_point(&self, offset: usize) -> Result<VirtualPoint, BufferError>;

    /// Text in `start..end`.
    fn slice(&self, start: usize, end: usize) -> Result<String, BufferError>;

    /// Replace `start..end` with `text`, producing a new snapshot.
    fn replace(&mut self, start: usize, end: usize, text: &str)
    -> Result<TextChange, BufferError>;

    /// Index of the last line.
    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// Character under `point`, if it is within its line.
    fn char_at(&self, point: VirtualPoint) -> Option<char> {
        if point.line >= self.line_count() {
            return None;
        }
        self.line_text(point.line).chars().nth(point.column)
    }

    /// Clamp `point` into the buffer. The column may rest at the end of the line.
    fn clamp_point(&self, point: VirtualPoint) -> VirtualPoint {
        let line = point.line.min(self.last_line());
        VirtualPoint::new(line, point.column.min(self.line_len(line)))
    }

    /// Insert `text` at `offset`.
    fn insert(&mut self, offset: usize, text: &str) -> Result<TextChange, BufferError> {
        self.replace(offset, offset, text)
    }

    /// Delete `start..end`.
    fn delete(&mut self, start: usize, end: usize) -> Result<TextChange, BufferError> {
        self.replace(start, end, "")
    }
}

/// A rope-backed buffer with undo history.
///
/// # Example
///
/// ```rust
/// use vim_multicaret::{RopeBuffer, TextBuffer, VirtualPoint};
///
/// let mut buffer = RopeBuffer::from_lines(&["abc def", ""]);
/// let change = buffer.insert(4, "xxx ").unwrap();
/// assert_eq!(buffer.lines(), vec!["abc xxx def", ""]);
/// assert_eq!(change.new_end, VirtualPoint::new(0, 8));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RopeBuffer {
    rope: Rope,
    version: SnapshotVersion,
    undo: UndoStack,
}

impl RopeBuffer {
    /// Create a buffer from text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: SnapshotVersion::default(),
            undo: UndoStack::default(),
        }
    }

    /// Create a buffer from lines joined with `\n`.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let text = lines
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(&text)
    }

    /// Cap the undo history at `max_undo` transactions.
    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.undo = UndoStack::new(max_undo);
        self
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// All lines, including a trailing empty line.
    pub fn lines(&self) -> Vec<String> {
        split_lines_preserve_trailing(&self.text())
    }

    /// The undo history.
    pub fn history(&self) -> &UndoStack {
        &self.undo
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Revert the last transaction and return the span set recorded before it.
    pub fn undo(&mut self) -> Option<Vec<SelectedSpan>> {
        let transaction = self.undo.pop_undo()?;
        for edit in transaction.edits.iter().rev() {
            let end = edit.start + edit.inserted_len();
            self.rope.remove(edit.start..end);
            self.rope.insert(edit.start, &edit.deleted_text);
        }
        self.version = self.version.next();
        trace!(target: "broadcast", id = transaction.id, version = %self.version, "undo");
        Some(transaction.spans_before)
    }

    /// Re-apply the last undone transaction and return the span set recorded after it.
    pub fn redo(&mut self) -> Option<Vec<SelectedSpan>> {
        let transaction = self.undo.pop_redo()?;
        for edit in &transaction.edits {
            let end = edit.start + edit.deleted_len();
            self.rope.remove(edit.start..end);
            self.rope.insert(edit.start, &edit.inserted_text);
        }
        self.version = self.version.next();
        trace!(target: "broadcast", id = transaction.id, version = %self.version, "redo");
        Some(transaction.spans_after)
    }

    fn body_len(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        match (
            len.checked_sub(2).map(|i| slice.char(i)),
            len.checked_sub(1).map(|i| slice.char(i)),
        ) {
            (Some('\r'), Some('\n')) => len - 2,
            (_, Some('\n' | '\r')) => len - 1,
            _ => len,
        }
    }
}

impl TextBuffer for RopeBuffer {
    fn version(&self) -> SnapshotVersion {
        self.version
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        self.body_len(line)
    }

    fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let len = self.body_len(line);
        self.rope.line(line).slice(..len).to_string()
    }

    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn point_to_offset(&self, point: VirtualPoint) -> usize {
        let point = self.clamp_point(point);
        self.rope.line_to_char(point.line) + point.column
    }

    fn offset_to_point(&self, offset: usize) -> Result<VirtualPoint, BufferError> {
        if offset > self.rope.len_chars() {
            return Err(BufferError::InvalidOffset(offset));
        }
        let line = self.rope.char_to_line(offset);
        Ok(VirtualPoint::new(line, offset - self.rope.line_to_char(line)))
    }

    fn slice(&self, start: usize, end: usize) -> Result<String, BufferError> {
        if start > end || end > self.rope.len_chars() {
            return Err(BufferError::InvalidRange { start, end });
        }
        Ok(self.rope.slice(start..end).to_string())
    }

    fn char_at(&self, point: VirtualPoint) -> Option<char> {
        if point.line >= self.rope.len_lines() || point.column >= self.body_len(point.line) {
            return None;
        }
        Some(self.rope.char(self.rope.line_to_char(point.line) + point.column))
    }

    fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<TextChange, BufferError> {
        let deleted_text = self.slice(start, end)?;
        let start_point = self.offset_to_point(start)?;
        let old_end = self.offset_to_point(end)?;
        let before = self.version;

        if start == end && text.is_empty() {
            return Ok(TextChange {
                start,
                removed_len: 0,
                inserted_len: 0,
                start_point,
                old_end,
                new_end: old_end,
                before,
                after: before,
            });
        }

        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.version = before.next();

        let inserted_len = text.chars().count();
        let new_end = self.offset_to_point(start + inserted_len)?;
        self.undo.record(
            TextEdit {
                start,
                deleted_text,
                inserted_text: text.to_string(),
            },
            &[],
        );

        trace!(
            target: "broadcast",
            start,
            removed = end - start,
            inserted = inserted_len,
            version = %self.version,
            "replace"
        );

        Ok(TextChange {
            start,
            removed_len: end - start,
            inserted_len,
            start_point,
            old_end,
            new_end,
            before,
            after: self.version,
        })
    }
}

impl UndoHistory for RopeBuffer {
    fn begin_linked_transaction(&mut self, spans_before: &[SelectedSpan]) -> TransactionHandle {
        self.undo.begin(spans_before)
    }

    fn end_transaction(&mut self, handle: TransactionHandle, spans_after: &[SelectedSpan]) {
        self.undo.end(handle, spans_after);
    }
}
