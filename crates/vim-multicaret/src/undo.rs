//! Linked undo transactions.
//!
//! A broadcast groups the edits made at every caret into one transaction, so a single undo
//! reverts all of them. Transactions nest: an insert session opens a transaction that stays open
//! across many broadcasts, and each broadcast opens an inner one. Inner transactions merge into the
//! outermost, which is committed when its handle is ended.

use crate::span::SelectedSpan;
use tracing::warn;

/// Handle returned by [`UndoHistory::begin_linked_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle {
    id: usize,
    depth: usize,
}

impl TransactionHandle {
    /// Identifier of the outermost transaction this handle belongs to.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Nesting depth (1 for the outermost transaction).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// The undo system as seen by the broadcaster.
pub trait UndoHistory {
    /// Open a transaction that records every edit until it is ended. `spans_before` is the span
    /// set to restore when the transaction is undone.
    fn begin_linked_transaction(&mut self, spans_before: &[SelectedSpan]) -> TransactionHandle;

    /// Close a transaction. `spans_after` is the span set to restore when it is redone.
    fn end_transaction(&mut self, handle: TransactionHandle, spans_after: &[SelectedSpan]);
}

/// One recorded replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start character offset at the time the edit was applied.
    pub start: usize,
    /// Removed text.
    pub deleted_text: String,
    /// Inserted text.
    pub inserted_text: String,
}

impl TextEdit {
    /// Length of `deleted_text` in characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }
}

/// A committed group of edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Identifier assigned when the transaction was opened.
    pub id: usize,
    /// Edits in the order they were applied.
    pub edits: Vec<TextEdit>,
    /// Span set before the first edit.
    pub spans_before: Vec<SelectedSpan>,
    /// Span set after the last edit.
    pub spans_after: Vec<SelectedSpan>,
}

#[derive(Debug, Clone)]
struct OpenTransaction {
    transaction: Transaction,
    depth: usize,
}

/// Undo and redo stacks of committed transactions.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    max_undo: usize,
    next_id: usize,
    open: Option<OpenTransaction>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl UndoStack {
    /// Create a stack keeping at most `max_undo` transactions.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            next_id: 0,
            open: None,
        }
    }

    /// Returns `true` if there is a transaction to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is a transaction to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of transactions on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of transactions on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns `true` while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.open.is_some()
    }

    /// Open a transaction, or nest into the open one.
    pub fn begin(&mut self, spans_before: &[SelectedSpan]) -> TransactionHandle {
        if let Some(open) = self.open.as_mut() {
            open.depth += 1;
            return TransactionHandle {
                id: open.transaction.id,
                depth: open.depth,
            };
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.open = Some(OpenTransaction {
            transaction: Transaction {
                id,
                edits: Vec::new(),
                spans_before: spans_before.to_vec(),
                spans_after: spans_before.to_vec(),
            },
            depth: 1,
        });
        TransactionHandle { id, depth: 1 }
    }

    /// Close the transaction `handle` refers to. The outermost close commits.
    pub fn end(&mut self, handle: TransactionHandle, spans_after: &[SelectedSpan]) {
        let Some(open) = self.open.as_mut() else {
            warn!(target: "broadcast", id = handle.id, "end_transaction without open transaction");
            return;
        };
        if open.transaction.id != handle.id || open.depth != handle.depth {
            warn!(
                target: "broadcast",
                expected_id = open.transaction.id,
                expected_depth = open.depth,
                id = handle.id,
                depth = handle.depth,
                "mismatched transaction handle"
            );
        }

        open.transaction.spans_after = spans_after.to_vec();
        if open.depth > 1 {
            open.depth -= 1;
            return;
        }

        if let Some(open) = self.open.take()
            && !open.transaction.edits.is_empty()
        {
            self.push(open.transaction);
        }
    }

    /// Record an edit into the open transaction, or as a transaction of its own.
    pub fn record(&mut self, edit: TextEdit, spans: &[SelectedSpan]) {
        match self.open.as_mut() {
            Some(open) => open.transaction.edits.push(edit),
            None => {
                let id = self.next_id;
                self.next_id = self.next_id.wrapping_add(1);
                self.push(Transaction {
                    id,
                    edits: vec![edit],
                    spans_before: spans.to_vec(),
                    spans_after: spans.to_vec(),
                });
            }
        }
    }

    fn push(&mut self, transaction: Transaction) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(transaction);
    }

    /// Take the transaction to undo and move it to the redo stack.
    ///
    /// Any open transaction is committed first.
    pub(crate) fn pop_undo(&mut self) -> Option<Transaction> {
        self.close_open();
        let transaction = self.undo_stack.pop()?;
        self.redo_stack.push(transaction.clone());
        Some(transaction)
    }

    /// Take the transaction to redo and move it back to the undo stack.
    pub(crate) fn pop_redo(&mut self) -> Option<Transaction> {
        self.close_open();
        let transaction = self.redo_stack.pop()?;
        self.undo_stack.push(transaction.clone());
        Some(transaction)
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            warn!(
                target: "broadcast",
                id = open.transaction.id,
                depth = open.depth,
                "closing open transaction for undo"
            );
            if !open.transaction.edits.is_empty() {
                self.push(open.transaction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::VirtualPoint;

    fn edit(start: usize, text: &str) -> TextEdit {
        TextEdit {
            start,
            deleted_text: String::new(),
            inserted_text: text.to_string(),
        }
    }

    fn spans(column: usize) -> Vec<SelectedSpan> {
        vec![SelectedSpan::caret(VirtualPoint::new(0, column))]
    }

    #[test]
    fn test_nested_transactions_merge_into_outermost() {
        let mut stack = UndoStack::default();
        let outer = stack.begin(&spans(0));
        let inner = stack.begin(&spans(5));
        assert_eq!(inner.id(), outer.id());
        assert_eq!(inner.depth(), 2);

        stack.record(edit(0, "a"), &[]);
        stack.end(inner, &spans(1));
        stack.record(edit(1, "b"), &[]);
        assert_eq!(stack.undo_depth(), 0);
        stack.end(outer, &spans(2));

        assert_eq!(stack.undo_depth(), 1);
        let transaction = stack.pop_undo().unwrap();
        assert_eq!(transaction.edits.len(), 2);
        assert_eq!(transaction.spans_before, spans(0));
        assert_eq!(transaction.spans_after, spans(2));
        assert!(stack.can_redo());
    }

    #[test]
    fn test_empty_transaction_is_dropped() {
        let mut stack = UndoStack::default();
        let handle = stack.begin(&spans(0));
        stack.end(handle, &spans(0));
        assert!(!stack.can_undo());
        assert!(!stack.in_transaction());
    }

    #[test]
    fn test_new_edit_clears_redo_and_respects_limit() {
        let mut stack = UndoStack::new(2);
        for column in 0..3 {
            stack.record(edit(column, "x"), &spans(column));
        }
        assert_eq!(stack.undo_depth(), 2);

        stack.pop_undo();
        assert_eq!(stack.redo_depth(), 1);
        stack.record(edit(0, "y"), &spans(0));
        assert_eq!(stack.redo_depth(), 0);
    }
}
