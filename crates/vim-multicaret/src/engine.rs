//! A small single-caret Vim engine.
//!
//! [`VimEngine`] implements [`ExecutionEngine`] for a practical subset of Vim: motions
//! (`h l j k w b e 0 ^ $ gg G`), the `d c y` operators with a motion or linewise, `x`, `p`/`P`,
//! the `i a I A` insert entries, typing, `v V <C-v>`, `gh gH`, shifted and unshifted special keys
//! and `:N`.
//!
//! Each caret has its own register slot: a yank or delete at caret `i` writes slot `i`, and caret
//! 0 also writes the unnamed register. A put at caret `i` reads slot `i`, falling back to the
//! unnamed register, so `dwwP` moves a different word at every caret.

use crate::broadcast::{CommandInfo, CommandScope, Execution, ExecutionContext, ExecutionEngine};
use crate::buffer::TextBuffer;
use crate::error::EngineError;
use crate::mode::{Mode, ModeEvent, VisualKind};
use crate::point::VirtualPoint;
use crate::settings::Settings;
use crate::span::SelectedSpan;
use crate::text::{
    CharClass, char_class, column_for_display, display_column, first_non_blank,
    next_grapheme_column, prev_grapheme_column,
};

/// A cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// `h`
    Left,
    /// `l`
    Right,
    /// `k`
    Up,
    /// `j`
    Down,
    /// `w`
    WordForward,
    /// `b`
    WordBackward,
    /// `e`
    WordEnd,
    /// `0`
    LineStart,
    /// `$`
    LineEnd,
    /// `^`
    FirstNonBlank,
    /// `gg` (a count selects the line)
    FirstLine,
    /// `G` (always the last line)
    LastLine,
}

/// An operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `d`
    Delete,
    /// `c`
    Change,
    /// `y`
    Yank,
}

/// Where an insert command places the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertEntry {
    /// `i`
    Before,
    /// `a`
    After,
    /// `I`
    LineStart,
    /// `A`
    LineEnd,
}

/// Commands understood by [`VimEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VimCommand {
    /// Move the caret (or the active end of the selection).
    Move {
        /// Motion to apply.
        motion: Motion,
        /// Repeat count.
        count: usize,
    },
    /// A shifted special key: start or extend a selection.
    Extend {
        /// Motion to apply.
        motion: Motion,
    },
    /// An unshifted special key such as `<Right>`: move, ending the selection when `keymodel`
    /// contains `stopsel`.
    Key {
        /// Motion to apply.
        motion: Motion,
    },
    /// Operator plus motion, such as `dw` or `c2e`.
    Operate {
        /// Operator to apply.
        operator: Operator,
        /// Motion covering the text.
        motion: Motion,
        /// Repeat count of the motion.
        count: usize,
    },
    /// Linewise operator, such as `dd` or `3yy`.
    OperateLines {
        /// Operator to apply.
        operator: Operator,
        /// Number of lines.
        count: usize,
    },
    /// `x`
    DeleteChar {
        /// Number of characters.
        count: usize,
    },
    /// `p` and `P`.
    Put {
        /// `P` when `true`.
        before: bool,
        /// Number of copies.
        count: usize,
    },
    /// `i`, `a`, `I`, `A`.
    Insert {
        /// Where the caret goes.
        entry: InsertEntry,
        /// Number of times the typed text is inserted.
        count: usize,
    },
    /// Typed text in Insert mode, or over a Select mode selection.
    Type(String),
    /// `<Esc>`
    Escape,
    /// `v`, `V`, `<C-v>`.
    Visual(VisualKind),
    /// `gh`, `gH`, `g<C-h>`.
    Select(VisualKind),
    /// An operator over the Visual selection.
    VisualOperate(Operator),
    /// `:N` (one-based).
    GotoLine(usize),
}

impl VimCommand {
    /// A motion without a count.
    pub fn motion(motion: Motion) -> Self {
        VimCommand::Move { motion, count: 1 }
    }

    /// An operator with a motion, without a count.
    pub fn operate(operator: Operator, motion: Motion) -> Self {
        VimCommand::Operate {
            operator,
            motion,
            count: 1,
        }
    }

    /// Typed text.
    pub fn typed(text: impl Into<String>) -> Self {
        VimCommand::Type(text.into())
    }
}

/// Register contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    /// Stored text (linewise text ends with a line break).
    pub text: String,
    /// Whether the text is whole lines.
    pub linewise: bool,
}

/// The unnamed and clipboard registers plus one slot per caret.
///
/// With `clipboard=unnamed` (or `unnamedplus`) the clipboard register takes the unnamed register's
/// place: caret 0 writes it too, and puts fall back to it.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    unnamed: Option<Register>,
    clipboard: Option<Register>,
    slots: Vec<Option<Register>>,
}

impl Registers {
    /// Store `register` for caret `caret_index` of `caret_count`.
    ///
    /// A single-caret write clears every other slot.
    pub fn write(&mut self, caret_index: usize, caret_count: usize, register: Register) {
        if caret_count <= 1 {
            self.slots.clear();
        }
        if self.slots.len() <= caret_index {
            self.slots.resize(caret_index + 1, None);
        }
        if caret_index == 0 {
            self.unnamed = Some(register.clone());
        }
        self.slots[caret_index] = Some(register);
    }

    /// Register for caret `caret_index`, or the unnamed register.
    pub fn read(&self, caret_index: usize) -> Option<&Register> {
        self.slots
            .get(caret_index)
            .and_then(Option::as_ref)
            .or(self.unnamed.as_ref())
    }

    /// Register for caret `caret_index`, or the clipboard register.
    pub fn read_clipboard(&self, caret_index: usize) -> Option<&Register> {
        self.slots
            .get(caret_index)
            .and_then(Option::as_ref)
            .or(self.clipboard.as_ref())
    }

    /// The unnamed register.
    pub fn unnamed(&self) -> Option<&Register> {
        self.unnamed.as_ref()
    }

    /// The clipboard register.
    pub fn clipboard(&self) -> Option<&Register> {
        self.clipboard.as_ref()
    }

    /// Replace the clipboard register, as when another program copies text.
    pub fn set_clipboard(&mut self, register: Register) {
        self.clipboard = Some(register);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionKind {
    Exclusive,
    Inclusive,
    Linewise,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    point: VirtualPoint,
    kind: MotionKind,
    desired_column: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnLimit {
    /// The caret rests on a character.
    OnChar,
    /// The caret may rest past the last character.
    PastEnd,
}

impl ColumnLimit {
    fn for_mode(mode: Mode, settings: &Settings) -> Self {
        match mode {
            Mode::Normal => ColumnLimit::OnChar,
            Mode::Visual(_) if settings.is_inclusive() => ColumnLimit::OnChar,
            Mode::Visual(_) | Mode::Insert | Mode::Select(_) => ColumnLimit::PastEnd,
        }
    }

    fn max_column(self, len: usize) -> usize {
        match self {
            ColumnLimit::OnChar => len.saturating_sub(1),
            ColumnLimit::PastEnd => len,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TextRange {
    start: usize,
    end: usize,
    linewise: bool,
    first_line: usize,
}

/// The reference single-caret engine.
#[derive(Debug, Clone, Default)]
pub struct VimEngine {
    registers: Registers,
}

impl VimEngine {
    /// Create an engine with empty registers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registers.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Mutable access to the registers.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
}

impl ExecutionEngine for VimEngine {
    type Command = VimCommand;

    fn describe(&self, command: &VimCommand) -> CommandInfo {
        let mut info = CommandInfo::default();
        match command {
            VimCommand::Move { .. } => {}
            VimCommand::Extend { .. } => info.mode_event = Some(ModeEvent::StartSelection),
            VimCommand::Key { .. } => info.mode_event = Some(ModeEvent::StopSelection),
            VimCommand::Operate { operator, .. } | VimCommand::OperateLines { operator, .. } => {
                info.starts_change = *operator != Operator::Yank;
                if *operator == Operator::Change {
                    info.mode_event = Some(ModeEvent::EnterInsert { count: 1 });
                }
            }
            VimCommand::DeleteChar { .. } | VimCommand::Put { .. } => info.starts_change = true,
            VimCommand::Insert { count, .. } => {
                info.mode_event = Some(ModeEvent::EnterInsert { count: *count });
                info.starts_change = true;
            }
            VimCommand::Type(text) => {
                info.mode_event = Some(ModeEvent::ReplaceSelection);
                info.typed_text = Some(text.clone());
            }
            VimCommand::Escape => info.mode_event = Some(ModeEvent::Escape),
            VimCommand::Visual(kind) => info.mode_event = Some(ModeEvent::EnterVisual(*kind)),
            VimCommand::Select(kind) => info.mode_event = Some(ModeEvent::EnterSelect(*kind)),
            VimCommand::VisualOperate(operator) => {
                info.mode_event = Some(match operator {
                    Operator::Change => ModeEvent::EnterInsert { count: 1 },
                    Operator::Delete | Operator::Yank => ModeEvent::OperatorComplete,
                });
            }
            VimCommand::GotoLine(_) => info.scope = CommandScope::PrimaryRelative,
        }
        info
    }

    fn execute<B: TextBuffer + ?Sized>(
        &mut self,
        context: &ExecutionContext<'_>,
        command: &VimCommand,
        span: SelectedSpan,
        buffer: &mut B,
    ) -> Result<Execution, EngineError> {
        let mode = context.mode_before;
        match command {
            VimCommand::Move { motion, count } => {
                if mode.has_selection() {
                    extend(context, *motion, *count, span, &*buffer)
                } else {
                    move_caret(context, *motion, *count, span, &*buffer)
                }
            }
            VimCommand::Extend { motion } => match mode {
                Mode::Normal if context.mode_after.has_selection() => extend(
                    context,
                    *motion,
                    1,
                    SelectedSpan::caret(span.caret),
                    &*buffer,
                ),
                Mode::Normal => move_caret(context, *motion, 1, span, &*buffer),
                Mode::Visual(_) | Mode::Select(_) => extend(context, *motion, 1, span, &*buffer),
                Mode::Insert => Err(EngineError::Unsupported),
            },
            VimCommand::Key { motion } => {
                if context.mode_after.has_selection() {
                    extend(context, *motion, 1, span, &*buffer)
                } else {
                    let caret = SelectedSpan::caret(span.caret);
                    move_caret(context, *motion, 1, caret, &*buffer)
                }
            }
            VimCommand::Operate {
                operator,
                motion,
                count,
            } => {
                if mode != Mode::Normal {
                    return Err(EngineError::Unsupported);
                }
                let range = operator_range(context, *operator, *motion, *count, span, &*buffer)?;
                self.apply_operator(context, *operator, range, span, buffer)
            }
            VimCommand::OperateLines { operator, count } => {
                if mode != Mode::Normal {
                    return Err(EngineError::Unsupported);
                }
                let last = (span.caret.line + (*count).max(1) - 1).min(buffer.last_line());
                let range = line_range(&*buffer, span.caret.line, last);
                self.apply_operator(context, *operator, range, span, buffer)
            }
            VimCommand::DeleteChar { count } => self.delete_char(context, *count, span, buffer),
            VimCommand::Put { before, count } => self.put(context, *before, *count, span, buffer),
            VimCommand::Insert { entry, .. } => {
                if !matches!(mode, Mode::Normal | Mode::Visual(_)) {
                    return Err(EngineError::Unsupported);
                }
                let caret = span.caret;
                let len = buffer.line_len(caret.line);
                let column = match entry {
                    InsertEntry::Before => caret.column.min(len),
                    InsertEntry::After => (caret.column + 1).min(len),
                    InsertEntry::LineStart => first_non_blank(&buffer.line_text(caret.line)),
                    InsertEntry::LineEnd => len,
                };
                Ok(Execution::moved(SelectedSpan::caret(caret.with_column(column))))
            }
            VimCommand::Type(text) => type_text(mode, text, span, buffer),
            VimCommand::Escape => escape(context, span, buffer),
            VimCommand::Visual(_) => {
                let caret = SelectedSpan::caret(span.caret);
                Ok(match (mode, context.mode_after) {
                    (_, Mode::Normal) => {
                        let point = clamp(&*buffer, span.caret, ColumnLimit::OnChar);
                        Execution::moved(SelectedSpan::caret(point))
                    }
                    (Mode::Visual(_) | Mode::Select(_), _) => Execution::moved(span),
                    _ => Execution::moved(caret),
                })
            }
            VimCommand::Select(_) => match mode {
                Mode::Normal => Ok(Execution::moved(SelectedSpan::caret(span.caret))),
                Mode::Visual(_) => Ok(Execution::moved(span)),
                Mode::Insert | Mode::Select(_) => Err(EngineError::Unsupported),
            },
            VimCommand::VisualOperate(operator) => {
                let Some(kind) = mode.visual_kind() else {
                    return Err(EngineError::Unsupported);
                };
                let range = visual_range(context.settings, kind, span, &*buffer);
                let collapsed = SelectedSpan::caret(span.start());
                self.apply_operator(context, *operator, range, collapsed, buffer)
            }
            VimCommand::GotoLine(number) => {
                let line = number.saturating_sub(1).min(buffer.last_line());
                let limit = ColumnLimit::for_mode(context.mode_after, context.settings);
                let column = if context.settings.start_of_line {
                    first_non_blank(&buffer.line_text(line))
                } else {
                    span.caret.column
                };
                let point = clamp(&*buffer, VirtualPoint::new(line, column), limit);
                Ok(Execution::moved(if mode.has_selection() {
                    SelectedSpan::selection(span.anchor, point)
                } else {
                    SelectedSpan::caret(point)
                }))
            }
        }
    }
}

impl VimEngine {
    fn write_register(&mut self, context: &ExecutionContext<'_>, text: String, linewise: bool) {
        let register = Register { text, linewise };
        if context.caret_index == 0 && context.settings.uses_clipboard() {
            self.registers.set_clipboard(register.clone());
        }
        self.registers.write(context.caret_index, context.caret_count, register);
    }

    fn read_register(&self, context: &ExecutionContext<'_>) -> Option<Register> {
        let register = if context.settings.uses_clipboard() {
            self.registers.read_clipboard(context.caret_index)
        } else {
            self.registers.read(context.caret_index)
        };
        register.cloned()
    }

    fn apply_operator<B: TextBuffer + ?Sized>(
        &mut self,
        context: &ExecutionContext<'_>,
        operator: Operator,
        range: TextRange,
        span: SelectedSpan,
        buffer: &mut B,
    ) -> Result<Execution, EngineError> {
        let text = buffer.slice(range.start, range.end)?;
        let register_text = if range.linewise && !text.ends_with('\n') {
            // The last line of the buffer has no line break of its own.
            format!("{}\n", text.strip_prefix('\n').unwrap_or(&text))
        } else {
            text
        };
        self.write_register(context, register_text, range.linewise);

        match operator {
            Operator::Yank => {
                let caret = if range.linewise {
                    span.caret
                } else {
                    buffer.offset_to_point(range.start)?
                };
                Ok(Execution::moved(SelectedSpan::caret(caret)))
            }
            Operator::Delete => {
                let change = buffer.delete(range.start, range.end)?;
                let caret = if range.linewise {
                    let line = range.first_line.min(buffer.last_line());
                    VirtualPoint::new(line, first_non_blank(&buffer.line_text(line)))
                } else {
                    change.start_point
                };
                Ok(Execution {
                    span: SelectedSpan::caret(clamp(&*buffer, caret, ColumnLimit::OnChar)),
                    changes: vec![change],
                    desired_column: None,
                })
            }
            Operator::Change => {
                let (start, end) = if range.linewise {
                    let first = range.first_line;
                    let last = buffer.offset_to_point(range.end)?.line;
                    let last = if range.end < buffer.char_count() {
                        last.saturating_sub(1)
                    } else {
                        last
                    };
                    (
                        buffer.point_to_offset(VirtualPoint::new(first, 0)),
                        buffer.point_to_offset(VirtualPoint::new(last, buffer.line_len(last))),
                    )
                } else {
                    (range.start, range.end)
                };
                let change = buffer.delete(start, end)?;
                Ok(Execution {
                    span: SelectedSpan::caret(change.start_point),
                    changes: vec![change],
                    desired_column: None,
                })
            }
        }
    }

    fn delete_char<B: TextBuffer + ?Sized>(
        &mut self,
        context: &ExecutionContext<'_>,
        count: usize,
        span: SelectedSpan,
        buffer: &mut B,
    ) -> Result<Execution, EngineError> {
        if context.mode_before != Mode::Normal {
            return Err(EngineError::Unsupported);
        }
        let caret = span.caret;
        let len = buffer.line_len(caret.line);
        if caret.column >= len {
            return Err(EngineError::MotionBoundary);
        }
        let start = buffer.point_to_offset(caret);
        let end = start + (len - caret.column).min(count.max(1));
        let range = TextRange {
            start,
            end,
            linewise: false,
            first_line: caret.line,
        };
        self.apply_operator(context, Operator::Delete, range, span, buffer)
    }

    fn put<B: TextBuffer + ?Sized>(
        &mut self,
        context: &ExecutionContext<'_>,
        before: bool,
        count: usize,
        span: SelectedSpan,
        buffer: &mut B,
    ) -> Result<Execution, EngineError> {
        if context.mode_before != Mode::Normal {
            return Err(EngineError::Unsupported);
        }
        let register = self.read_register(context).ok_or(EngineError::NothingToPut)?;
        let text = register.text.repeat(count.max(1));
        let caret = span.caret;

        if register.linewise {
            let (offset, inserted, line) = if before {
                let offset = buffer.point_to_offset(caret.with_column(0));
                (offset, text, caret.line)
            } else if caret.line < buffer.last_line() {
                let offset = buffer.point_to_offset(VirtualPoint::new(caret.line + 1, 0));
                (offset, text, caret.line + 1)
            } else {
                let body = text.strip_suffix('\n').unwrap_or(&text);
                (buffer.char_count(), format!("\n{body}"), caret.line + 1)
            };
            let change = buffer.insert(offset, &inserted)?;
            let point = VirtualPoint::new(line, first_non_blank(&buffer.line_text(line)));
            return Ok(Execution {
                span: SelectedSpan::caret(clamp(&*buffer, point, ColumnLimit::OnChar)),
                changes: vec![change],
                desired_column: None,
            });
        }

        let mut offset = buffer.point_to_offset(caret);
        if !before && buffer.line_len(caret.line) > 0 {
            offset += 1;
        }
        let change = buffer.insert(offset, &text)?;
        let last = offset + text.chars().count().saturating_sub(1);
        let point = buffer.offset_to_point(last)?;
        Ok(Execution {
            span: SelectedSpan::caret(point),
            changes: vec![change],
            desired_column: None,
        })
    }
}

fn move_caret<B: TextBuffer + ?Sized>(
    context: &ExecutionContext<'_>,
    motion: Motion,
    count: usize,
    span: SelectedSpan,
    buffer: &B,
) -> Result<Execution, EngineError> {
    let limit = ColumnLimit::for_mode(context.mode_after, context.settings);
    let target = motion_target(context, motion, count, span.caret, limit, buffer);
    let point = clamp(buffer, target.point, limit);
    if point == span.caret {
        return Err(EngineError::MotionBoundary);
    }
    Ok(Execution {
        span: SelectedSpan::caret(point),
        changes: Vec::new(),
        desired_column: target.desired_column,
    })
}

fn extend<B: TextBuffer + ?Sized>(
    context: &ExecutionContext<'_>,
    motion: Motion,
    count: usize,
    span: SelectedSpan,
    buffer: &B,
) -> Result<Execution, EngineError> {
    let limit = ColumnLimit::for_mode(context.mode_after, context.settings);
    let target = motion_target(context, motion, count, span.caret, limit, buffer);
    let mut point = clamp(buffer, target.point, limit);
    if target.kind == MotionKind::Inclusive
        && context.mode_after.is_visual()
        && !context.settings.is_inclusive()
    {
        // An exclusive selection has to end past the last character it covers.
        point = clamp(buffer, point.offset_columns(1), ColumnLimit::PastEnd);
    }
    if point == span.caret {
        return Err(EngineError::MotionBoundary);
    }
    Ok(Execution {
        span: SelectedSpan::selection(span.anchor, point),
        changes: Vec::new(),
        desired_column: target.desired_column,
    })
}

fn type_text<B: TextBuffer + ?Sized>(
    mode: Mode,
    text: &str,
    span: SelectedSpan,
    buffer: &mut B,
) -> Result<Execution, EngineError> {
    let (start, end) = match mode {
        Mode::Insert => {
            let offset = buffer.point_to_offset(span.caret);
            (offset, offset)
        }
        Mode::Select(_) => (
            buffer.point_to_offset(span.start()),
            buffer.point_to_offset(span.end()),
        ),
        Mode::Normal | Mode::Visual(_) => return Err(EngineError::Unsupported),
    };
    let change = buffer.replace(start, end, text)?;
    let caret = buffer.offset_to_point(start + text.chars().count())?;
    Ok(Execution {
        span: SelectedSpan::caret(caret),
        changes: vec![change],
        desired_column: None,
    })
}

fn escape<B: TextBuffer + ?Sized>(
    context: &ExecutionContext<'_>,
    span: SelectedSpan,
    buffer: &mut B,
) -> Result<Execution, EngineError> {
    match context.mode_before {
        Mode::Insert => {
            let mut caret = span.caret;
            let mut changes = Vec::new();
            if let Some(replay) = context.insert_replay {
                let len = replay.text.chars().count();
                for _ in 0..replay.times {
                    let offset = buffer.point_to_offset(caret);
                    changes.push(buffer.insert(offset, &replay.text)?);
                    caret = buffer.offset_to_point(offset + len)?;
                }
            }
            let column = prev_grapheme_column(&buffer.line_text(caret.line), caret.column);
            Ok(Execution {
                span: SelectedSpan::caret(caret.with_column(column)),
                changes,
                desired_column: None,
            })
        }
        Mode::Visual(_) | Mode::Select(_) => Ok(Execution::moved(SelectedSpan::caret(clamp(
            &*buffer,
            span.caret,
            ColumnLimit::OnChar,
        )))),
        Mode::Normal => Ok(Execution::moved(span)),
    }
}

fn clamp<B: TextBuffer + ?Sized>(
    buffer: &B,
    point: VirtualPoint,
    limit: ColumnLimit,
) -> VirtualPoint {
    let line = point.line.min(buffer.last_line());
    let max = limit.max_column(buffer.line_len(line));
    VirtualPoint::new(line, point.column.min(max))
}

fn motion_target<B: TextBuffer + ?Sized>(
    context: &ExecutionContext<'_>,
    motion: Motion,
    count: usize,
    from: VirtualPoint,
    limit: ColumnLimit,
    buffer: &B,
) -> Target {
    let count = count.max(1);
    let from = buffer.clamp_point(from);
    let text = buffer.line_text(from.line);
    let len = buffer.line_len(from.line);
    let exclusive = |point| Target {
        point,
        kind: MotionKind::Exclusive,
        desired_column: None,
    };

    match motion {
        Motion::Left => {
            let column = (0..count).fold(from.column, |column, _| {
                prev_grapheme_column(&text, column)
            });
            exclusive(from.with_column(column))
        }
        Motion::Right => {
            let max = limit.max_column(len);
            let column = (0..count).fold(from.column, |column, _| {
                next_grapheme_column(&text, column).min(max)
            });
            exclusive(from.with_column(column))
        }
        Motion::Up | Motion::Down => {
            let tab_stop = context.settings.tab_stop;
            let desired = context
                .desired_column
                .unwrap_or_else(|| display_column(&text, from.column, tab_stop));
            let line = if motion == Motion::Up {
                from.line.saturating_sub(count)
            } else {
                (from.line + count).min(buffer.last_line())
            };
            let target_text = buffer.line_text(line);
            let column = column_for_display(&target_text, desired, tab_stop)
                .min(limit.max_column(buffer.line_len(line)));
            Target {
                point: VirtualPoint::new(line, column),
                kind: MotionKind::Linewise,
                desired_column: Some(desired),
            }
        }
        Motion::WordForward => {
            exclusive((0..count).fold(from, |point, _| next_word_start(buffer, point)))
        }
        Motion::WordBackward => {
            exclusive((0..count).fold(from, |point, _| prev_word_start(buffer, point)))
        }
        Motion::WordEnd => Target {
            point: (0..count).fold(from, |point, _| word_end(buffer, point)),
            kind: MotionKind::Inclusive,
            desired_column: None,
        },
        Motion::LineStart => exclusive(from.with_column(0)),
        Motion::FirstNonBlank => exclusive(from.with_column(first_non_blank(&text))),
        Motion::LineEnd => {
            let line = (from.line + count - 1).min(buffer.last_line());
            Target {
                point: VirtualPoint::new(line, buffer.line_len(line)),
                kind: MotionKind::Inclusive,
                desired_column: Some(usize::MAX),
            }
        }
        Motion::FirstLine | Motion::LastLine => {
            let line = if motion == Motion::FirstLine {
                (count - 1).min(buffer.last_line())
            } else {
                buffer.last_line()
            };
            Target {
                point: VirtualPoint::new(line, first_non_blank(&buffer.line_text(line))),
                kind: MotionKind::Linewise,
                desired_column: None,
            }
        }
    }
}

fn operator_range<B: TextBuffer + ?Sized>(
    context: &ExecutionContext<'_>,
    operator: Operator,
    motion: Motion,
    count: usize,
    span: SelectedSpan,
    buffer: &B,
) -> Result<TextRange, EngineError> {
    let caret = buffer.clamp_point(span.caret);

    let target = if operator == Operator::Change
        && motion == Motion::WordForward
        && class_at(buffer, caret) != CharClass::Blank
    {
        // `cw` on a word changes to the end of that word, like `ce`.
        let end = (1..count.max(1)).fold(current_word_end(buffer, caret), |point, _| {
            word_end(buffer, point)
        });
        Target {
            point: end,
            kind: MotionKind::Inclusive,
            desired_column: None,
        }
    } else {
        let mut target =
            motion_target(context, motion, count, caret, ColumnLimit::PastEnd, buffer);
        if motion == Motion::WordForward && target.point.line > caret.line {
            // `dw` on the last word of a line stops at the end of that line.
            target.point = VirtualPoint::new(caret.line, buffer.line_len(caret.line));
        }
        target
    };

    if target.kind == MotionKind::Linewise {
        let first = caret.line.min(target.point.line);
        let last = caret.line.max(target.point.line);
        return Ok(line_range(buffer, first, last));
    }

    let (start, end) = if target.point < caret {
        (target.point, caret)
    } else {
        (caret, target.point)
    };
    let start_offset = buffer.point_to_offset(start);
    let mut end_offset = buffer.point_to_offset(end);
    if target.kind == MotionKind::Inclusive {
        end_offset = (end_offset + 1).min(buffer.char_count());
    }
    if end_offset <= start_offset {
        return Err(EngineError::MotionBoundary);
    }
    Ok(TextRange {
        start: start_offset,
        end: end_offset,
        linewise: false,
        first_line: start.line,
    })
}

fn visual_range<B: TextBuffer + ?Sized>(
    settings: &Settings,
    kind: VisualKind,
    span: SelectedSpan,
    buffer: &B,
) -> TextRange {
    let (start, end) = (span.start(), span.end());
    if kind == VisualKind::Line {
        return line_range(buffer, start.line, end.line);
    }
    let start_offset = buffer.point_to_offset(start);
    let mut end_offset = buffer.point_to_offset(end);
    if settings.is_inclusive() || end_offset == start_offset {
        end_offset = (end_offset + 1).min(buffer.char_count());
    }
    TextRange {
        start: start_offset,
        end: end_offset,
        linewise: false,
        first_line: start.line,
    }
}

fn line_range<B: TextBuffer + ?Sized>(buffer: &B, first: usize, last: usize) -> TextRange {
    let mut start = buffer.point_to_offset(VirtualPoint::new(first, 0));
    let end = if last < buffer.last_line() {
        buffer.point_to_offset(VirtualPoint::new(last + 1, 0))
    } else {
        // Deleting through the last line also removes the line break before it.
        start = start.saturating_sub(1);
        buffer.char_count()
    };
    TextRange {
        start,
        end,
        linewise: true,
        first_line: first,
    }
}

fn class_at<B: TextBuffer + ?Sized>(buffer: &B, point: VirtualPoint) -> CharClass {
    buffer.char_at(point).map_or(CharClass::Blank, char_class)
}

fn is_empty_line<B: TextBuffer + ?Sized>(buffer: &B, point: VirtualPoint) -> bool {
    buffer.line_len(point.line) == 0
}

fn step_forward<B: TextBuffer + ?Sized>(buffer: &B, point: VirtualPoint) -> Option<VirtualPoint> {
    if point.column < buffer.line_len(point.line) {
        Some(point.with_column(point.column + 1))
    } else if point.line < buffer.last_line() {
        Some(VirtualPoint::new(point.line + 1, 0))
    } else {
        None
    }
}

fn step_back<B: TextBuffer + ?Sized>(buffer: &B, point: VirtualPoint) -> Option<VirtualPoint> {
    if point.column > 0 {
        Some(point.with_column(point.column - 1))
    } else if point.line > 0 {
        Some(VirtualPoint::new(point.line - 1, buffer.line_len(point.line - 1)))
    } else {
        None
    }
}

fn next_word_start<B: TextBuffer + ?Sized>(buffer: &B, from: VirtualPoint) -> VirtualPoint {
    let mut point = from;
    let class = class_at(buffer, point);
    if class != CharClass::Blank {
        loop {
            match step_forward(buffer, point) {
                Some(next) => {
                    point = next;
                    if class_at(buffer, point) != class {
                        break;
                    }
                }
                None => return point,
            }
        }
    }
    loop {
        if class_at(buffer, point) != CharClass::Blank
            || (point != from && is_empty_line(buffer, point))
        {
            return point;
        }
        match step_forward(buffer, point) {
            Some(next) => point = next,
            None => return point,
        }
    }
}

fn prev_word_start<B: TextBuffer + ?Sized>(buffer: &B, from: VirtualPoint) -> VirtualPoint {
    let Some(mut point) = step_back(buffer, from) else {
        return from;
    };
    while class_at(buffer, point) == CharClass::Blank && !is_empty_line(buffer, point) {
        match step_back(buffer, point) {
            Some(previous) => point = previous,
            None => return point,
        }
    }
    if is_empty_line(buffer, point) {
        return point;
    }
    let class = class_at(buffer, point);
    while let Some(previous) = step_back(buffer, point) {
        if class_at(buffer, previous) != class {
            break;
        }
        point = previous;
    }
    point
}

fn word_end<B: TextBuffer + ?Sized>(buffer: &B, from: VirtualPoint) -> VirtualPoint {
    let Some(mut point) = step_forward(buffer, from) else {
        return from;
    };
    while class_at(buffer, point) == CharClass::Blank {
        match step_forward(buffer, point) {
            Some(next) => point = next,
            None => return point,
        }
    }
    current_word_end(buffer, point)
}

fn current_word_end<B: TextBuffer + ?Sized>(buffer: &B, from: VirtualPoint) -> VirtualPoint {
    let class = class_at(buffer, from);
    let mut point = from;
    while let Some(next) = step_forward(buffer, point) {
        if class_at(buffer, next) != class {
            break;
        }
        point = next;
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RopeBuffer;

    fn p(line: usize, column: usize) -> VirtualPoint {
        VirtualPoint::new(line, column)
    }

    #[test]
    fn test_word_motions() {
        let buffer = RopeBuffer::from_lines(&["abc def.ghi", "", "  jkl"]);
        assert_eq!(next_word_start(&buffer, p(0, 0)), p(0, 4));
        assert_eq!(next_word_start(&buffer, p(0, 4)), p(0, 7));
        assert_eq!(next_word_start(&buffer, p(0, 8)), p(1, 0));
        assert_eq!(next_word_start(&buffer, p(1, 0)), p(2, 2));

        assert_eq!(prev_word_start(&buffer, p(2, 2)), p(1, 0));
        assert_eq!(prev_word_start(&buffer, p(1, 0)), p(0, 8));
        assert_eq!(prev_word_start(&buffer, p(0, 7)), p(0, 4));
        assert_eq!(prev_word_start(&buffer, p(0, 0)), p(0, 0));

        assert_eq!(word_end(&buffer, p(0, 0)), p(0, 2));
        assert_eq!(word_end(&buffer, p(0, 2)), p(0, 6));
        assert_eq!(word_end(&buffer, p(0, 8)), p(0, 10));
        assert_eq!(word_end(&buffer, p(0, 10)), p(2, 4));
    }

    #[test]
    fn test_registers_fall_back_to_unnamed() {
        let mut registers = Registers::default();
        let register = |text: &str| Register {
            text: text.to_string(),
            linewise: false,
        };
        registers.write(0, 2, register("a"));
        registers.write(1, 2, register("b"));
        assert_eq!(registers.read(1).map(|r| r.text.as_str()), Some("b"));

        registers.write(0, 1, register("c"));
        assert_eq!(registers.read(1).map(|r| r.text.as_str()), Some("c"));
        assert_eq!(registers.unnamed().map(|r| r.text.as_str()), Some("c"));
    }

    #[test]
    fn test_clipboard_register_replaces_unnamed_fallback() {
        let mut registers = Registers::default();
        let register = |text: &str| Register {
            text: text.to_string(),
            linewise: false,
        };
        registers.write(0, 2, register("a"));
        assert_eq!(registers.read_clipboard(1), None);

        registers.set_clipboard(register("clip"));
        assert_eq!(registers.read_clipboard(0).map(|r| r.text.as_str()), Some("a"));
        assert_eq!(registers.read_clipboard(1).map(|r| r.text.as_str()), Some("clip"));
        assert_eq!(registers.read(1).map(|r| r.text.as_str()), Some("a"));
    }

    #[test]
    fn test_describe_marks_changes_and_scope() {
        let engine = VimEngine::new();
        assert!(
            engine
                .describe(&VimCommand::operate(Operator::Delete, Motion::WordForward))
                .starts_change
        );
        assert!(
            !engine
                .describe(&VimCommand::operate(Operator::Yank, Motion::WordForward))
                .starts_change
        );
        assert_eq!(
            engine.describe(&VimCommand::GotoLine(3)).scope,
            CommandScope::PrimaryRelative
        );
        assert_eq!(
            engine.describe(&VimCommand::typed("x")).mode_event,
            Some(ModeEvent::ReplaceSelection)
        );
    }
}
