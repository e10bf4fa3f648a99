//! Modal state shared by every caret of a buffer.
//!
//! The mode is global: all spans of a [`crate::MultiSelectionTracker`] are in the same mode at
//! any instant. [`ModeState`] also owns the bookkeeping of the current insert session (the repeat
//! count it was entered with and the text typed so far) so that leaving Insert mode can replay the
//! typed text `count - 1` more times at every caret.

use crate::settings::Settings;
use std::fmt;

/// Shape of a Visual or Select mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisualKind {
    /// Character-wise (`v`, `gh`).
    #[default]
    Character,
    /// Line-wise (`V`, `gH`).
    Line,
    /// Block-wise (`<C-v>`, `g<C-h>`).
    Block,
}

/// The modal state of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Normal mode.
    #[default]
    Normal,
    /// Insert mode.
    Insert,
    /// Visual mode of the given kind.
    Visual(VisualKind),
    /// Select mode of the given kind.
    Select(VisualKind),
}

impl Mode {
    /// Returns `true` in any Visual mode.
    pub fn is_visual(&self) -> bool {
        matches!(self, Mode::Visual(_))
    }

    /// Returns `true` in any Select mode.
    pub fn is_select(&self) -> bool {
        matches!(self, Mode::Select(_))
    }

    /// Returns `true` in Visual or Select mode.
    pub fn has_selection(&self) -> bool {
        self.is_visual() || self.is_select()
    }

    /// The selection kind in Visual or Select mode.
    pub fn visual_kind(&self) -> Option<VisualKind> {
        match self {
            Mode::Visual(kind) | Mode::Select(kind) => Some(*kind),
            Mode::Normal | Mode::Insert => None,
        }
    }

    /// Returns `true` if the caret may rest just past the last character of a line.
    ///
    /// In Normal and Visual mode the caret sits on a character; Insert and Select mode place it
    /// between characters.
    pub fn allows_end_of_line(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Select(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual(VisualKind::Character) => "VISUAL",
            Mode::Visual(VisualKind::Line) => "VISUAL LINE",
            Mode::Visual(VisualKind::Block) => "VISUAL BLOCK",
            Mode::Select(VisualKind::Character) => "SELECT",
            Mode::Select(VisualKind::Line) => "SELECT LINE",
            Mode::Select(VisualKind::Block) => "SELECT BLOCK",
        };
        f.write_str(name)
    }
}

/// An input that may change the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeEvent {
    /// `v`, `V`, `<C-v>`.
    EnterVisual(VisualKind),
    /// `gh`, `gH`, `g<C-h>`.
    EnterSelect(VisualKind),
    /// A shifted special key such as `<S-Right>`.
    StartSelection,
    /// An unshifted special key such as `<Right>`.
    StopSelection,
    /// Selecting text with the mouse, as with a double-click.
    MouseSelection,
    /// An insert-triggering command, with its repeat count.
    EnterInsert {
        /// Number of times the typed text is inserted in total.
        count: usize,
    },
    /// Typing a printable character over a Select mode selection.
    ReplaceSelection,
    /// `<Esc>`.
    Escape,
    /// An operator finished (for example `d` in Visual mode).
    OperatorComplete,
}

/// Text left to replay when an insert session with a count ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReplay {
    /// Text typed during the session.
    pub text: String,
    /// Additional insertions (count minus one).
    pub times: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InsertSession {
    count: usize,
    typed: String,
}

/// Compute the mode that `event` leads to from `mode`.
///
/// Events that do not apply in `mode` leave it unchanged.
pub fn transition(mode: Mode, event: ModeEvent, settings: &Settings) -> Mode {
    match (mode, event) {
        (Mode::Normal, ModeEvent::EnterVisual(kind)) if settings.selects_from_command() => {
            Mode::Select(kind)
        }
        (Mode::Normal, ModeEvent::EnterVisual(kind)) => Mode::Visual(kind),
        (Mode::Visual(current), ModeEvent::EnterVisual(kind)) if current == kind => Mode::Normal,
        (Mode::Visual(_), ModeEvent::EnterVisual(kind)) => Mode::Visual(kind),
        (Mode::Select(_), ModeEvent::EnterVisual(kind)) => Mode::Visual(kind),

        (Mode::Normal | Mode::Visual(_), ModeEvent::EnterSelect(kind)) => Mode::Select(kind),

        (Mode::Normal, ModeEvent::StartSelection) if settings.selects_from_keyboard() => {
            Mode::Select(VisualKind::Character)
        }
        (Mode::Normal, ModeEvent::StartSelection) if settings.starts_selection() => {
            Mode::Visual(VisualKind::Character)
        }
        (Mode::Visual(kind), ModeEvent::StartSelection) if settings.selects_from_keyboard() => {
            Mode::Select(kind)
        }

        (Mode::Visual(_) | Mode::Select(_), ModeEvent::StopSelection)
            if settings.stops_selection() =>
        {
            Mode::Normal
        }

        (_, ModeEvent::MouseSelection) if settings.selects_from_mouse() => {
            Mode::Select(VisualKind::Character)
        }
        (_, ModeEvent::MouseSelection) => Mode::Visual(VisualKind::Character),

        (Mode::Normal | Mode::Visual(_), ModeEvent::EnterInsert { .. }) => Mode::Insert,
        (Mode::Select(_), ModeEvent::ReplaceSelection) => Mode::Insert,

        (Mode::Visual(_), ModeEvent::OperatorComplete) => Mode::Normal,
        (Mode::Insert | Mode::Visual(_) | Mode::Select(_), ModeEvent::Escape) => Mode::Normal,

        (mode, _) => mode,
    }
}

/// Current mode plus the state of an open insert session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeState {
    mode: Mode,
    insert: Option<InsertSession>,
}

impl ModeState {
    /// Start in Normal mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The mode `event` would lead to, without committing it.
    pub fn peek(&self, event: ModeEvent, settings: &Settings) -> Mode {
        transition(self.mode, event, settings)
    }

    /// Text to replay if `event` ends the current insert session.
    ///
    /// Returns `None` unless `event` leaves Insert mode, the session was entered with a count
    /// above one, and something was typed.
    pub fn insert_replay(&self, event: ModeEvent) -> Option<InsertReplay> {
        if self.mode != Mode::Insert || event != ModeEvent::Escape {
            return None;
        }
        let session = self.insert.as_ref()?;
        if session.count <= 1 || session.typed.is_empty() {
            return None;
        }
        Some(InsertReplay {
            text: session.typed.clone(),
            times: session.count - 1,
        })
    }

    /// Append typed text to the open insert session.
    pub fn record_typed(&mut self, text: &str) {
        if let Some(session) = self.insert.as_mut() {
            session.typed.push_str(text);
        }
    }

    /// The text typed so far in the open insert session.
    pub fn typed_text(&self) -> Option<&str> {
        self.insert.as_ref().map(|session| session.typed.as_str())
    }

    /// Apply `event` and return the new mode.
    pub fn commit(&mut self, event: ModeEvent, settings: &Settings) -> Mode {
        let next = transition(self.mode, event, settings);
        if next == Mode::Insert && self.mode != Mode::Insert {
            let count = match event {
                ModeEvent::EnterInsert { count } => count.max(1),
                _ => 1,
            };
            self.insert = Some(InsertSession {
                count,
                typed: String::new(),
            });
        } else if next != Mode::Insert {
            self.insert = None;
        }
        self.mode = next;
        next
    }

    /// Force the mode (used after undo and redo), dropping any insert session.
    pub fn reset(&mut self, mode: Mode) {
        self.mode = mode;
        self.insert = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{KeyModelOptions, SelectModeOptions};

    #[test]
    fn test_visual_toggle_and_switch() {
        let settings = Settings::default();
        let mode = transition(
            Mode::Normal,
            ModeEvent::EnterVisual(VisualKind::Character),
            &settings,
        );
        assert_eq!(mode, Mode::Visual(VisualKind::Character));
        assert_eq!(
            transition(mode, ModeEvent::EnterVisual(VisualKind::Line), &settings),
            Mode::Visual(VisualKind::Line)
        );
        assert_eq!(
            transition(mode, ModeEvent::EnterVisual(VisualKind::Character), &settings),
            Mode::Normal
        );
        assert_eq!(
            transition(mode, ModeEvent::OperatorComplete, &settings),
            Mode::Normal
        );
    }

    #[test]
    fn test_start_selection_depends_on_settings() {
        let mut settings = Settings::default();
        assert_eq!(
            transition(Mode::Normal, ModeEvent::StartSelection, &settings),
            Mode::Normal
        );

        settings.key_model = KeyModelOptions::START_SELECTION;
        assert_eq!(
            transition(Mode::Normal, ModeEvent::StartSelection, &settings),
            Mode::Visual(VisualKind::Character)
        );

        settings.select_mode = SelectModeOptions::MOUSE | SelectModeOptions::KEYBOARD;
        assert_eq!(
            transition(Mode::Normal, ModeEvent::StartSelection, &settings),
            Mode::Select(VisualKind::Character)
        );
        assert_eq!(
            transition(
                Mode::Visual(VisualKind::Line),
                ModeEvent::StartSelection,
                &settings
            ),
            Mode::Select(VisualKind::Line)
        );
    }

    #[test]
    fn test_select_mode_options_and_stopsel() {
        let mut settings = Settings::default();
        let select = Mode::Select(VisualKind::Character);
        assert_eq!(
            transition(Mode::Normal, ModeEvent::MouseSelection, &settings),
            Mode::Visual(VisualKind::Character)
        );
        assert_eq!(
            transition(select, ModeEvent::StopSelection, &settings),
            select
        );

        settings.select_mode = SelectModeOptions::MOUSE | SelectModeOptions::COMMAND;
        settings.key_model = KeyModelOptions::STOP_SELECTION;
        assert_eq!(
            transition(Mode::Insert, ModeEvent::MouseSelection, &settings),
            select
        );
        assert_eq!(
            transition(
                Mode::Normal,
                ModeEvent::EnterVisual(VisualKind::Line),
                &settings
            ),
            Mode::Select(VisualKind::Line)
        );
        assert_eq!(
            transition(select, ModeEvent::StopSelection, &settings),
            Mode::Normal
        );
        assert_eq!(
            transition(Mode::Normal, ModeEvent::StopSelection, &settings),
            Mode::Normal
        );
    }

    #[test]
    fn test_insert_session_replay() {
        let settings = Settings::default();
        let mut state = ModeState::new();
        assert_eq!(
            state.commit(ModeEvent::EnterInsert { count: 3 }, &settings),
            Mode::Insert
        );
        state.record_typed("ab");
        state.record_typed("c");
        assert_eq!(state.typed_text(), Some("abc"));

        assert_eq!(
            state.insert_replay(ModeEvent::Escape),
            Some(InsertReplay {
                text: "abc".to_string(),
                times: 2,
            })
        );
        assert_eq!(state.commit(ModeEvent::Escape, &settings), Mode::Normal);
        assert_eq!(state.typed_text(), None);
    }

    #[test]
    fn test_no_replay_without_count() {
        let settings = Settings::default();
        let mut state = ModeState::new();
        state.commit(ModeEvent::EnterInsert { count: 1 }, &settings);
        state.record_typed("xyz");
        assert_eq!(state.insert_replay(ModeEvent::Escape), None);
        assert_eq!(state.insert_replay(ModeEvent::OperatorComplete), None);
    }

    #[test]
    fn test_select_replace_enters_insert() {
        let settings = Settings::default();
        let mut state = ModeState::new();
        state.commit(ModeEvent::EnterSelect(VisualKind::Character), &settings);
        assert!(state.mode().is_select());
        assert_eq!(
            state.commit(ModeEvent::ReplaceSelection, &settings),
            Mode::Insert
        );
        assert_eq!(state.typed_text(), Some(""));
        assert_eq!(state.commit(ModeEvent::Escape, &settings), Mode::Normal);
    }
}
