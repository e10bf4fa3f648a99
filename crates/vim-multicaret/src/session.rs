//! One buffer edited with several carets.
//!
//! [`MultiCaretSession`] wires the pieces together: a [`RopeBuffer`], the
//! [`MultiSelectionTracker`] of its spans, the buffer's [`ModeState`] and [`Settings`], and a
//! [`CommandBroadcaster`] driving an [`ExecutionEngine`]. Input arrives as [`Action`]s: engine
//! commands, undo and redo, `.`, caret additions and removals, and mouse word selections.
//!
//! # Example
//!
//! ```rust
//! use vim_multicaret::{
//!     Action, Motion, MultiCaretSession, OverlayHost, SelectedSpan, Settings, VimCommand,
//!     VimEngine, VirtualPoint,
//! };
//!
//! let host = OverlayHost::new(SelectedSpan::caret(VirtualPoint::new(0, 4)));
//! let text = "abc def ghi\njkl mno pqr";
//! let mut session = MultiCaretSession::new(text, VimEngine::new(), host, Settings::default());
//! session.process(Action::AddCaret(VirtualPoint::new(1, 4)));
//! session.process(Action::Engine(VimCommand::motion(Motion::WordForward)));
//!
//! assert_eq!(session.carets(), vec![VirtualPoint::new(0, 8), VirtualPoint::new(1, 8)]);
//! ```

use crate::broadcast::{BroadcastOutcome, CommandBroadcaster, EditTarget, ExecutionEngine};
use crate::buffer::{RopeBuffer, TextBuffer};
use crate::error::{SettingsError, TrackerError};
use crate::host::SelectionHost;
use crate::mode::{Mode, ModeEvent, ModeState};
use crate::point::VirtualPoint;
use crate::settings::Settings;
use crate::span::SelectedSpan;
use crate::text::word_bounds;
use crate::tracker::{CaretDirection, MultiSelectionTracker, TrackedSpan};
use tracing::debug;

/// An input to a [`MultiCaretSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<C> {
    /// Run an engine command at every caret.
    Engine(C),
    /// Undo the last change.
    Undo,
    /// Redo the last undone change.
    Redo,
    /// `.`
    RepeatLastChange,
    /// Add a caret, as with a modifier-click.
    AddCaret(VirtualPoint),
    /// Add a caret one line above the topmost or below the bottommost caret.
    AddCaretOnLine(CaretDirection),
    /// Remove a secondary span.
    RemoveCaret(SelectedSpan),
    /// Drop every secondary span.
    CollapseToPrimary,
    /// The host moved its native selection.
    HostSelectionChanged(SelectedSpan),
    /// Select the word at a point, as with a double-click. The word becomes the only span.
    SelectWord(VirtualPoint),
    /// Add the word at a point as another span, as with an alt-double-click.
    AddWordSelection(VirtualPoint),
}

/// What processing an [`Action`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A command ran at the carets.
    Broadcast(BroadcastOutcome),
    /// Undo or redo restored this many spans.
    Restored(usize),
    /// The caret set changed.
    CaretsChanged,
    /// The tracker refused the action (the host has beeped).
    Rejected(TrackerError),
    /// Nothing to do (the host has beeped).
    Nothing,
}

/// A buffer, its spans and the engine that edits it.
pub struct MultiCaretSession<E: ExecutionEngine, H: SelectionHost> {
    buffer: RopeBuffer,
    tracker: MultiSelectionTracker<H>,
    broadcaster: CommandBroadcaster<E::Command>,
    engine: E,
    mode: ModeState,
    settings: Settings,
}

impl<E: ExecutionEngine, H: SelectionHost> MultiCaretSession<E, H> {
    /// Create a session over `text`, attached to `host`.
    pub fn new(text: &str, engine: E, host: H, settings: Settings) -> Self {
        let buffer = RopeBuffer::new(text);
        let tracker = MultiSelectionTracker::attach(host, buffer.version());
        Self {
            buffer,
            tracker,
            broadcaster: CommandBroadcaster::new(),
            engine,
            mode: ModeState::new(),
            settings,
        }
    }

    /// The buffer.
    pub fn buffer(&self) -> &RopeBuffer {
        &self.buffer
    }

    /// Buffer lines, including a trailing empty line.
    pub fn lines(&self) -> Vec<String> {
        self.buffer.lines()
    }

    /// The span set.
    pub fn tracker(&self) -> &MultiSelectionTracker<H> {
        &self.tracker
    }

    /// Mutable access to the span set.
    pub fn tracker_mut(&mut self) -> &mut MultiSelectionTracker<H> {
        &mut self.tracker
    }

    /// The host.
    pub fn host(&self) -> &H {
        self.tracker.host()
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The current mode.
    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    /// The buffer settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the buffer settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Apply a Vim option assignment such as `selection=exclusive`.
    pub fn apply_option(&mut self, assignment: &str) -> Result<(), SettingsError> {
        self.settings.apply_option(assignment)
    }

    /// Commands of the last completed change.
    pub fn last_change(&self) -> Option<&[E::Command]> {
        self.broadcaster.last_change()
    }

    /// All spans, primary first, in host form.
    pub fn selected_spans(&self) -> Vec<SelectedSpan> {
        self.tracker.selected_spans()
    }

    /// All carets, primary first.
    pub fn carets(&self) -> Vec<VirtualPoint> {
        self.tracker.snapshot().carets()
    }

    /// Replace the span set with bare carets; the first becomes the primary.
    pub fn set_carets(&mut self, carets: &[VirtualPoint]) {
        let spans: Vec<SelectedSpan> = carets.iter().copied().map(SelectedSpan::caret).collect();
        self.tracker.set_selected_spans(&spans);
    }

    /// Process one action.
    pub fn process(&mut self, action: Action<E::Command>) -> ActionOutcome {
        match action {
            Action::Engine(command) => self.run(&command),
            Action::Undo => {
                let spans = self.buffer.undo();
                self.restore(spans, "undo")
            }
            Action::Redo => {
                let spans = self.buffer.redo();
                self.restore(spans, "redo")
            }
            Action::RepeatLastChange => {
                if self.mode.mode() != Mode::Normal {
                    self.tracker.host_mut().beep();
                    return ActionOutcome::Nothing;
                }
                let mut target = EditTarget {
                    buffer: &mut self.buffer,
                    tracker: &mut self.tracker,
                    mode: &mut self.mode,
                    settings: &self.settings,
                };
                self.broadcaster
                    .repeat_last_change(&mut self.engine, &mut target)
                    .map_or(ActionOutcome::Nothing, ActionOutcome::Broadcast)
            }
            Action::AddCaret(point) => caret_outcome(self.tracker.add_caret(point)),
            Action::AddCaretOnLine(direction) => caret_outcome(
                self.tracker
                    .add_caret_on_line(direction, &self.buffer, &self.settings, self.mode.mode())
                    .map(|_| ()),
            ),
            Action::RemoveCaret(span) => caret_outcome(self.tracker.remove_caret(span)),
            Action::CollapseToPrimary => {
                self.tracker.collapse_to_primary();
                ActionOutcome::CaretsChanged
            }
            Action::HostSelectionChanged(span) => {
                self.tracker.on_host_selection_changed(span);
                ActionOutcome::CaretsChanged
            }
            Action::SelectWord(point) => self.select_word(point, false),
            Action::AddWordSelection(point) => self.select_word(point, true),
        }
    }

    /// Mouse word selection. The mode becomes Select or Visual depending on `selectmode`, and
    /// kept spans are carried over into it.
    fn select_word(&mut self, point: VirtualPoint, add: bool) -> ActionOutcome {
        let mode_before = self.mode.mode();
        let mode = self.mode.peek(ModeEvent::MouseSelection, &self.settings);
        let word = self.word_span(self.buffer.clamp_point(point), mode);
        if add && self.carets().contains(&word.caret) {
            self.tracker.host_mut().beep();
            return ActionOutcome::Rejected(TrackerError::DuplicateCaret(word.caret));
        }

        if mode_before == Mode::Insert {
            let spans = self.tracker.selected_spans();
            self.broadcaster.end_insert_session(&mut self.buffer, &spans);
        }
        self.mode.commit(ModeEvent::MouseSelection, &self.settings);
        debug!(target: "selection", caret = %word.caret, add, mode = %mode, "select word");

        if !add {
            self.tracker.set_selected_spans(&[word]);
            return ActionOutcome::CaretsChanged;
        }
        let settings = &self.settings;
        let carried: Vec<TrackedSpan> = self
            .tracker
            .tracked_spans()
            .iter()
            .map(|entry| TrackedSpan {
                span: entry
                    .span
                    .to_engine_form(mode_before, settings)
                    .to_host_form(mode, settings),
                desired_column: entry.desired_column,
            })
            .collect();
        self.tracker.set_tracked_spans(carried);
        caret_outcome(self.tracker.add_span(word))
    }

    /// The word around `point` as a span in host form for `mode`.
    fn word_span(&self, point: VirtualPoint, mode: Mode) -> SelectedSpan {
        let (start, end) = word_bounds(&self.buffer.line_text(point.line), point.column);
        let anchor = VirtualPoint::new(point.line, start);
        if start == end {
            return SelectedSpan::caret(anchor);
        }
        // Inclusive Visual mode keeps the caret on the last character.
        let active = if mode.is_visual() && self.settings.is_inclusive() {
            end - 1
        } else {
            end
        };
        SelectedSpan::selection(anchor, VirtualPoint::new(point.line, active))
            .to_host_form(mode, &self.settings)
    }

    fn run(&mut self, command: &E::Command) -> ActionOutcome {
        let info = self.engine.describe(command);
        if self.mode.mode() == Mode::Normal
            && info.mode_event == Some(ModeEvent::Escape)
            && self.tracker.has_secondaries()
        {
            debug!(target: "selection", "escape collapses to primary");
            self.tracker.collapse_to_primary();
            return ActionOutcome::CaretsChanged;
        }

        let mut target = EditTarget {
            buffer: &mut self.buffer,
            tracker: &mut self.tracker,
            mode: &mut self.mode,
            settings: &self.settings,
        };
        ActionOutcome::Broadcast(
            self.broadcaster
                .broadcast(&mut self.engine, command, &mut target),
        )
    }

    fn restore(&mut self, spans: Option<Vec<SelectedSpan>>, action: &'static str) -> ActionOutcome {
        self.broadcaster.abandon_insert_session();
        let Some(spans) = spans else {
            self.tracker.host_mut().beep();
            return ActionOutcome::Nothing;
        };

        let carets: Vec<SelectedSpan> = spans
            .iter()
            .map(|span| {
                let caret = self.buffer.clamp_point(span.caret);
                let max_column = self.buffer.line_len(caret.line).saturating_sub(1);
                SelectedSpan::caret(caret.with_column(caret.column.min(max_column)))
            })
            .collect();
        self.tracker.set_version(self.buffer.version());
        if !carets.is_empty() {
            self.tracker.set_selected_spans(&carets);
        }
        self.mode.reset(Mode::Normal);
        debug!(target: "selection", action, spans = carets.len(), "restored spans");
        ActionOutcome::Restored(carets.len())
    }
}

fn caret_outcome(result: Result<(), TrackerError>) -> ActionOutcome {
    match result {
        Ok(()) => ActionOutcome::CaretsChanged,
        Err(error) => ActionOutcome::Rejected(error),
    }
}
