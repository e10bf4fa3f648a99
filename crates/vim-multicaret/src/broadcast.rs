//! Applying one command at every caret.
//!
//! [`CommandBroadcaster::broadcast`] runs a command through an [`ExecutionEngine`] once per span,
//! so the buffer ends up as if the user had issued the command once at each original caret:
//!
//! 1. the span set is snapshotted primary first,
//! 2. one linked undo transaction is opened for the whole broadcast,
//! 3. spans run in ascending caret order (ties keep set order),
//! 4. after every change the spans not yet run, and the results already collected, are translated
//!    across it with [`OffsetTranslator`] (a span not yet run moves past text inserted right at
//!    it),
//! 5. results are written back in set order and the transaction is closed.
//!
//! A failing caret keeps its span and does not stop the others. If every caret fails the host
//! beeps once.
//!
//! The broadcaster also keeps the insert session transaction (one undo reverts a whole insert at
//! every caret) and the last change for `.`.

use crate::buffer::TextBuffer;
use crate::error::EngineError;
use crate::host::SelectionHost;
use crate::mode::{InsertReplay, Mode, ModeEvent, ModeState};
use crate::point::VirtualPoint;
use crate::settings::Settings;
use crate::span::SelectedSpan;
use crate::text::first_non_blank;
use crate::tracker::{MultiSelectionTracker, TrackedSpan};
use crate::translate::{OffsetTranslator, TextChange};
use crate::undo::{TransactionHandle, UndoHistory};
use std::fmt;
use tracing::{debug, trace};

/// How a command maps onto the span set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandScope {
    /// Run once per span.
    #[default]
    EachCaret,
    /// Run once on the primary; every secondary moves by the same number of lines.
    PrimaryRelative,
}

/// What the broadcaster needs to know about a command before running it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandInfo {
    /// Mode change the command causes, if any.
    pub mode_event: Option<ModeEvent>,
    /// Text the command types in Insert mode.
    pub typed_text: Option<String>,
    /// The command starts a repeatable change when issued in Normal mode.
    pub starts_change: bool,
    /// How the command maps onto the span set.
    pub scope: CommandScope,
}

/// Per-caret context handed to the engine.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Mode before the command.
    pub mode_before: Mode,
    /// Mode after the command.
    pub mode_after: Mode,
    /// Buffer settings.
    pub settings: &'a Settings,
    /// Index of this span in the set (0 is the primary).
    pub caret_index: usize,
    /// Number of spans the command runs at.
    pub caret_count: usize,
    /// Sticky display column of this span.
    pub desired_column: Option<usize>,
    /// Text to replay when the command ends an insert session with a count.
    pub insert_replay: Option<&'a InsertReplay>,
}

/// Result of running a command at one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// New span in engine form, against the buffer as it now stands.
    pub span: SelectedSpan,
    /// Buffer changes made, in the order they were applied.
    pub changes: Vec<TextChange>,
    /// Sticky display column to keep for the span.
    pub desired_column: Option<usize>,
}

impl Execution {
    /// A span change without buffer edits.
    pub fn moved(span: SelectedSpan) -> Self {
        Self {
            span,
            changes: Vec::new(),
            desired_column: None,
        }
    }
}

/// A single-caret command interpreter.
pub trait ExecutionEngine {
    /// Parsed command type.
    type Command: Clone + fmt::Debug;

    /// Describe `command` without running it.
    fn describe(&self, command: &Self::Command) -> CommandInfo;

    /// Run `command` at `span` (engine form), mutating `buffer`.
    fn execute<B: TextBuffer + ?Sized>(
        &mut self,
        context: &ExecutionContext<'_>,
        command: &Self::Command,
        span: SelectedSpan,
        buffer: &mut B,
    ) -> Result<Execution, EngineError>;
}

/// Everything a broadcast reads and writes.
pub struct EditTarget<'a, B: ?Sized, H: SelectionHost> {
    /// The buffer and its undo history.
    pub buffer: &'a mut B,
    /// The span set.
    pub tracker: &'a mut MultiSelectionTracker<H>,
    /// The buffer's mode.
    pub mode: &'a mut ModeState,
    /// The buffer's settings.
    pub settings: &'a Settings,
}

/// Summary of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastOutcome {
    /// Spans the command ran at successfully.
    pub processed: usize,
    /// Spans the engine reported an error for.
    pub failed: usize,
    /// Buffer changes, in the order they were applied.
    pub changes: Vec<TextChange>,
}

impl BroadcastOutcome {
    fn absorb(&mut self, other: BroadcastOutcome) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.changes.extend(other.changes);
    }
}

/// Runs commands at every span and remembers the last change.
#[derive(Debug, Clone)]
pub struct CommandBroadcaster<C> {
    last_change: Option<Vec<C>>,
    recording: Option<Vec<C>>,
    insert_transaction: Option<TransactionHandle>,
    replaying: bool,
}

impl<C> Default for CommandBroadcaster<C> {
    fn default() -> Self {
        Self {
            last_change: None,
            recording: None,
            insert_transaction: None,
            replaying: false,
        }
    }
}

impl<C: Clone + fmt::Debug> CommandBroadcaster<C> {
    /// Create a broadcaster with no recorded change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the last completed change.
    pub fn last_change(&self) -> Option<&[C]> {
        self.last_change.as_deref()
    }

    /// Returns `true` while an insert session transaction is open.
    pub fn in_insert_session(&self) -> bool {
        self.insert_transaction.is_some()
    }

    /// Forget the open insert session and any partial recording.
    ///
    /// Used when undo or redo interrupts Insert mode; the undo history has already committed the
    /// session's edits.
    pub fn abandon_insert_session(&mut self) {
        self.insert_transaction = None;
        self.recording = None;
    }

    /// Close the open insert session transaction, for when Insert mode ends outside a broadcast
    /// (a mouse selection, for example). A partial recording is dropped.
    pub fn end_insert_session<B: UndoHistory + ?Sized>(
        &mut self,
        history: &mut B,
        spans_after: &[SelectedSpan],
    ) {
        if let Some(session) = self.insert_transaction.take() {
            history.end_transaction(session, spans_after);
        }
        self.recording = None;
    }

    /// Run `command` at every span of `target.tracker`.
    pub fn broadcast<E, B, H>(
        &mut self,
        engine: &mut E,
        command: &C,
        target: &mut EditTarget<'_, B, H>,
    ) -> BroadcastOutcome
    where
        E: ExecutionEngine<Command = C>,
        B: TextBuffer + UndoHistory + ?Sized,
        H: SelectionHost,
    {
        let info = engine.describe(command);
        let settings = target.settings;
        let mode_before = target.mode.mode();
        let mode_after = info
            .mode_event
            .map_or(mode_before, |event| target.mode.peek(event, settings));
        let insert_replay = info
            .mode_event
            .and_then(|event| target.mode.insert_replay(event));

        let spans_before = target.tracker.selected_spans();
        debug!(
            target: "broadcast",
            ?command,
            carets = spans_before.len(),
            mode = %mode_before,
            "broadcast"
        );

        if mode_after == Mode::Insert && self.insert_transaction.is_none() {
            self.insert_transaction = Some(target.buffer.begin_linked_transaction(&spans_before));
        }
        let handle = target.buffer.begin_linked_transaction(&spans_before);

        let outcome = match info.scope {
            CommandScope::EachCaret => self.run_each_caret(
                engine,
                command,
                target,
                mode_before,
                mode_after,
                insert_replay.as_ref(),
            ),
            CommandScope::PrimaryRelative => {
                self.run_primary_relative(engine, command, target, mode_before, mode_after)
            }
        };

        if outcome.processed == 0 && outcome.failed > 0 {
            target.tracker.host_mut().beep();
        }

        let mode = match info.mode_event {
            Some(event) => target.mode.commit(event, settings),
            None => mode_before,
        };
        if mode == Mode::Insert
            && let Some(text) = info.typed_text.as_deref()
        {
            target.mode.record_typed(text);
        }

        let spans_after = target.tracker.selected_spans();
        target.buffer.end_transaction(handle, &spans_after);
        if mode != Mode::Insert
            && let Some(session) = self.insert_transaction.take()
        {
            target.buffer.end_transaction(session, &spans_after);
        }

        self.record(command, &info, mode_before, mode);

        debug!(
            target: "broadcast",
            processed = outcome.processed,
            failed = outcome.failed,
            changes = outcome.changes.len(),
            mode = %mode,
            "broadcast done"
        );
        outcome
    }

    /// Re-run the last change at every span as one undo step.
    ///
    /// Returns `None` (and beeps) if there is no recorded change.
    pub fn repeat_last_change<E, B, H>(
        &mut self,
        engine: &mut E,
        target: &mut EditTarget<'_, B, H>,
    ) -> Option<BroadcastOutcome>
    where
        E: ExecutionEngine<Command = C>,
        B: TextBuffer + UndoHistory + ?Sized,
        H: SelectionHost,
    {
        let Some(commands) = self.last_change.clone() else {
            target.tracker.host_mut().beep();
            return None;
        };
        debug!(target: "broadcast", commands = commands.len(), "repeat last change");

        let spans_before = target.tracker.selected_spans();
        let handle = target.buffer.begin_linked_transaction(&spans_before);
        self.replaying = true;
        let mut outcome = BroadcastOutcome::default();
        for command in &commands {
            outcome.absorb(self.broadcast(engine, command, target));
        }
        self.replaying = false;
        let spans_after = target.tracker.selected_spans();
        target.buffer.end_transaction(handle, &spans_after);
        Some(outcome)
    }

    fn record(&mut self, command: &C, info: &CommandInfo, mode_before: Mode, mode_after: Mode) {
        if self.replaying {
            return;
        }
        if let Some(recording) = self.recording.as_mut() {
            recording.push(command.clone());
        } else if info.starts_change && mode_before == Mode::Normal {
            self.recording = Some(vec![command.clone()]);
        } else {
            return;
        }
        if mode_after == Mode::Normal {
            self.last_change = self.recording.take();
            trace!(target: "broadcast", "recorded last change");
        }
    }

    fn run_each_caret<E, B, H>(
        &mut self,
        engine: &mut E,
        command: &C,
        target: &mut EditTarget<'_, B, H>,
        mode_before: Mode,
        mode_after: Mode,
        insert_replay: Option<&InsertReplay>,
    ) -> BroadcastOutcome
    where
        E: ExecutionEngine<Command = C>,
        B: TextBuffer + UndoHistory + ?Sized,
        H: SelectionHost,
    {
        let settings = target.settings;
        let mut current: Vec<TrackedSpan> = target.tracker.tracked_spans().to_vec();
        let caret_count = current.len();

        let mut order: Vec<usize> = (0..caret_count).collect();
        order.sort_by_key(|&index| current[index].span.caret);

        let mut done = vec![false; caret_count];
        let mut outcome = BroadcastOutcome::default();
        for index in order {
            done[index] = true;
            let entry = current[index];
            let span = entry.span.to_engine_form(mode_before, settings);
            let context = ExecutionContext {
                mode_before,
                mode_after,
                settings,
                caret_index: index,
                caret_count,
                desired_column: entry.desired_column,
                insert_replay,
            };

            match engine.execute(&context, command, span, &mut *target.buffer) {
                Ok(execution) => {
                    for change in &execution.changes {
                        let translator = OffsetTranslator::new(*change);
                        for (other, tracked) in current.iter_mut().enumerate() {
                            if other == index {
                                continue;
                            }
                            tracked.span = if done[other] {
                                translator.translate_span(tracked.span)
                            } else {
                                translator.translate_span_after(tracked.span)
                            };
                        }
                    }
                    trace!(
                        target: "broadcast",
                        index,
                        from = %span.caret,
                        to = %execution.span.caret,
                        changes = execution.changes.len(),
                        "caret executed"
                    );
                    current[index] = TrackedSpan {
                        span: execution.span.to_host_form(mode_after, settings),
                        desired_column: execution.desired_column,
                    };
                    outcome.processed += 1;
                    outcome.changes.extend(execution.changes);
                }
                Err(error) => {
                    trace!(target: "broadcast", index, %error, "caret failed");
                    current[index].span = span.to_host_form(mode_after, settings);
                    outcome.failed += 1;
                }
            }
        }

        target.tracker.set_version(target.buffer.version());
        target.tracker.set_tracked_spans(current);
        outcome
    }

    fn run_primary_relative<E, B, H>(
        &mut self,
        engine: &mut E,
        command: &C,
        target: &mut EditTarget<'_, B, H>,
        mode_before: Mode,
        mode_after: Mode,
    ) -> BroadcastOutcome
    where
        E: ExecutionEngine<Command = C>,
        B: TextBuffer + UndoHistory + ?Sized,
        H: SelectionHost,
    {
        let settings = target.settings;
        let mut current: Vec<TrackedSpan> = target.tracker.tracked_spans().to_vec();
        let primary = current[0];
        let span = primary.span.to_engine_form(mode_before, settings);
        let context = ExecutionContext {
            mode_before,
            mode_after,
            settings,
            caret_index: 0,
            caret_count: 1,
            desired_column: primary.desired_column,
            insert_replay: None,
        };

        let mut outcome = BroadcastOutcome::default();
        let execution = match engine.execute(&context, command, span, &mut *target.buffer) {
            Ok(execution) => execution,
            Err(error) => {
                trace!(target: "broadcast", %error, "primary failed");
                outcome.failed = 1;
                return outcome;
            }
        };

        for change in &execution.changes {
            let translator = OffsetTranslator::new(*change);
            for tracked in current.iter_mut().skip(1) {
                tracked.span = translator.translate_span(tracked.span);
            }
        }

        let delta = execution.span.caret.line as isize - span.caret.line as isize;
        let buffer = &*target.buffer;
        for tracked in current.iter_mut().skip(1) {
            let line = tracked
                .span
                .caret
                .line
                .saturating_add_signed(delta)
                .min(buffer.last_line());
            let column = if settings.start_of_line {
                first_non_blank(&buffer.line_text(line))
            } else {
                tracked.span.caret.column
            };
            let len = buffer.line_len(line);
            let max_column = if mode_after.allows_end_of_line() {
                len
            } else {
                len.saturating_sub(1)
            };
            *tracked = TrackedSpan {
                span: SelectedSpan::caret(VirtualPoint::new(line, column.min(max_column))),
                desired_column: tracked.desired_column,
            };
        }
        trace!(target: "broadcast", delta, "secondaries follow primary");

        current[0] = TrackedSpan {
            span: execution.span.to_host_form(mode_after, settings),
            desired_column: execution.desired_column,
        };
        outcome.processed = 1;
        outcome.changes = execution.changes;

        target.tracker.set_version(target.buffer.version());
        target.tracker.set_tracked_spans(current);
        outcome
    }
}
