//! Error types.
//!
//! Every failure in this crate is recoverable. The tracker and broadcaster handle their errors
//! locally (the host beeps); the error values are returned so callers and tests can observe what
//! happened.

use crate::point::VirtualPoint;
use crate::span::SelectedSpan;
use crate::tracker::CaretDirection;
use thiserror::Error;

/// Failures of [`crate::MultiSelectionTracker`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A caret already exists at this point.
    #[error("a caret already exists at {0}")]
    DuplicateCaret(VirtualPoint),
    /// Vertical caret addition ran past the first or last line.
    #[error("no line {direction} line {line}")]
    NoSuchLine {
        /// Line of the caret the addition started from.
        line: usize,
        /// Direction of the attempted addition.
        direction: CaretDirection,
    },
    /// The span to remove is not in the set.
    #[error("span is not part of the selection set")]
    NotFound,
    /// The primary span cannot be removed directly.
    #[error("the primary span cannot be removed")]
    PrimaryRemoval,
    /// The host's native selection disagrees with the recorded primary span.
    #[error("host selection {host:?} disagrees with recorded primary {recorded:?}")]
    HostDesync {
        /// Primary span recorded by the tracker.
        recorded: SelectedSpan,
        /// Native selection reported by the host.
        host: SelectedSpan,
    },
}

/// Failures of a single-caret command execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The motion cannot move past the start or end of the buffer.
    #[error("motion hit the buffer boundary")]
    MotionBoundary,
    /// A put found no register content.
    #[error("nothing in register")]
    NothingToPut,
    /// The command is not supported in the current mode.
    #[error("command not supported here")]
    Unsupported,
    /// The buffer rejected an edit.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Failures of [`crate::TextBuffer`] addressing and edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Offset past the end of the buffer.
    #[error("invalid offset: {0}")]
    InvalidOffset(usize),
    /// Range is reversed or extends past the end of the buffer.
    #[error("invalid range: {start}..{end}")]
    InvalidRange {
        /// Start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
}

/// Failures while loading or updating [`crate::Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The TOML document could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// The settings could not be written as TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The option name is not known.
    #[error("unknown option: {0}")]
    UnknownOption(String),
    /// The option value is not valid for this option.
    #[error("invalid value {value:?} for option {option}")]
    InvalidValue {
        /// Option name as given.
        option: String,
        /// Rejected value.
        value: String,
    },
}
