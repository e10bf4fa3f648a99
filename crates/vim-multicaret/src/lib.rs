#![warn(missing_docs)]
//! Vim Multicaret - Modal Editing With Any Number Of Carets
//!
//! # Overview
//!
//! `vim-multicaret` keeps several caret/selection pairs consistent while a single-caret Vim
//! engine edits a buffer in Normal, Insert, Visual and Select mode. The host editor surface only
//! knows one native caret and selection; the remaining carets are an internal model mirrored to
//! the host as an overlay (or as native spans when the host supports them).
//!
//! Three problems are solved here:
//!
//! - an edit at one caret shifts the buffer under every other caret, so stored positions are
//!   translated across each change
//! - only the primary caret is tracked natively, so the secondaries are kept in sync with it
//! - Vim's inclusive selections and the host's exclusive ones are converted in both directions
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  MultiCaretSession (actions, undo, repeat)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  CommandBroadcaster                         │  ← One command, every caret
//! ├─────────────────────────────────────────────┤
//! │  ExecutionEngine (VimEngine)                │  ← Single-caret semantics
//! ├─────────────────────────────────────────────┤
//! │  MultiSelectionTracker + SelectionHost      │  ← Span set, host mirror
//! ├─────────────────────────────────────────────┤
//! │  OffsetTranslator, SelectedSpan, ModeState  │  ← Pure value logic
//! ├─────────────────────────────────────────────┤
//! │  RopeBuffer + UndoStack                     │  ← Text and history
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use vim_multicaret::{
//!     Action, Motion, MultiCaretSession, Operator, OverlayHost, SelectedSpan, Settings,
//!     VimCommand, VimEngine, VirtualPoint,
//! };
//!
//! let host = OverlayHost::new(SelectedSpan::caret(VirtualPoint::new(0, 4)));
//! let mut session = MultiCaretSession::new(
//!     "abc def ghi\njkl mno pqr",
//!     VimEngine::new(),
//!     host,
//!     Settings::default(),
//! );
//! session.process(Action::AddCaret(VirtualPoint::new(1, 4)));
//!
//! // `dw` at both carets
//! session.process(Action::Engine(VimCommand::operate(Operator::Delete, Motion::WordForward)));
//! assert_eq!(session.lines(), vec!["abc ghi", "jkl pqr"]);
//!
//! // one undo reverts both deletions
//! session.process(Action::Undo);
//! assert_eq!(session.lines(), vec!["abc def ghi", "jkl mno pqr"]);
//! ```
//!
//! # Module Description
//!
//! - [`point`] - virtual points and snapshot versions
//! - [`span`] - selected spans and inclusive/exclusive conversion
//! - [`mode`] - modes, transitions and insert sessions
//! - [`settings`] - Vim options affecting selection behaviour
//! - [`translate`] - offset translation across one text change
//! - [`buffer`] - the host text buffer interface and a rope-backed buffer
//! - [`undo`] - linked undo transactions
//! - [`host`] - host selection surfaces
//! - [`tracker`] - the multi-selection set
//! - [`broadcast`] - running one command at every caret
//! - [`engine`] - a reference Vim engine
//! - [`session`] - everything wired together
//!
//! # Logging
//!
//! The crate logs through `tracing` under the `selection` and `broadcast` targets. It never
//! installs a subscriber.

pub mod broadcast;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod host;
pub mod mode;
pub mod point;
pub mod session;
pub mod settings;
pub mod span;
mod text;
pub mod tracker;
pub mod translate;
pub mod undo;

pub use broadcast::{
    BroadcastOutcome, CommandBroadcaster, CommandInfo, CommandScope, EditTarget, Execution,
    ExecutionContext, ExecutionEngine,
};
pub use buffer::{RopeBuffer, TextBuffer};
pub use engine::{InsertEntry, Motion, Operator, Register, Registers, VimCommand, VimEngine};
pub use error::{BufferError, EngineError, SettingsError, TrackerError};
pub use host::{HostCapability, NativeMultiSelectionHost, OverlayHost, SelectionHost};
pub use mode::{InsertReplay, Mode, ModeEvent, ModeState, VisualKind, transition};
pub use point::{SnapshotVersion, VirtualPoint};
pub use session::{Action, ActionOutcome, MultiCaretSession};
pub use settings::{
    ClipboardOptions, KeyModelOptions, SelectModeOptions, SelectionKind, Settings,
};
pub use span::SelectedSpan;
pub use text::{
    CharClass, char_class, column_for_display, display_column, first_non_blank, word_bounds,
};
pub use tracker::{CaretDirection, MultiSelectionTracker, SelectionSnapshot, TrackedSpan};
pub use translate::{OffsetTranslator, TextChange};
pub use undo::{TextEdit, Transaction, TransactionHandle, UndoHistory, UndoStack};
