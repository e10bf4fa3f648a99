#![allow(dead_code)]

//! Shared helpers: session setup and a tiny key notation.
//!
//! The notation covers the keys the scenarios use: motions `h j k l w b e 0 ^ $ gg G`, operators
//! `d c y` (doubled for lines), `x p P i a I A v V gh gH u .`, `:N<CR>`, `<Esc>`, the shifted
//! keys `<S-Left> <S-Right> <C-S-Left> <C-S-Right>` and their unshifted forms. In Insert and
//! Select mode every other character is typed.

use vim_multicaret::{
    Action, InsertEntry, Mode, Motion, MultiCaretSession, Operator, OverlayHost, SelectedSpan,
    Settings, VimCommand, VimEngine, VirtualPoint, VisualKind,
};

pub type Session = MultiCaretSession<VimEngine, OverlayHost>;

pub fn p(line: usize, column: usize) -> VirtualPoint {
    VirtualPoint::new(line, column)
}

pub fn session(lines: &[&str], carets: &[(usize, usize)]) -> Session {
    session_with(lines, carets, Settings::default())
}

pub fn session_with(lines: &[&str], carets: &[(usize, usize)], settings: Settings) -> Session {
    let points: Vec<VirtualPoint> = carets.iter().map(|&(line, column)| p(line, column)).collect();
    let host = OverlayHost::new(SelectedSpan::caret(points[0]));
    let mut session = MultiCaretSession::new(&lines.join("\n"), VimEngine::new(), host, settings);
    session.set_carets(&points);
    session
}

pub fn exclusive() -> Settings {
    let mut settings = Settings::default();
    settings.apply_option("selection=exclusive").unwrap();
    settings
}

pub fn carets(session: &Session) -> Vec<VirtualPoint> {
    session.carets()
}

pub fn keys(session: &mut Session, input: &str) {
    let mut rest = input;
    while !rest.is_empty() {
        let (action, consumed) = next_action(session.mode(), rest);
        session.process(action);
        rest = &rest[consumed..];
    }
}

const UNSHIFTED_KEYS: &[(&str, Motion)] = &[
    ("<Left>", Motion::Left),
    ("<Right>", Motion::Right),
    ("<C-Left>", Motion::WordBackward),
    ("<C-Right>", Motion::WordForward),
];

const SPECIAL_KEYS: &[(&str, Option<Motion>)] = &[
    ("<Esc>", None),
    ("<S-Left>", Some(Motion::Left)),
    ("<S-Right>", Some(Motion::Right)),
    ("<C-S-Left>", Some(Motion::WordBackward)),
    ("<C-S-Right>", Some(Motion::WordForward)),
];

fn motion_for(key: char) -> Option<Motion> {
    Some(match key {
        'h' => Motion::Left,
        'l' => Motion::Right,
        'k' => Motion::Up,
        'j' => Motion::Down,
        'w' => Motion::WordForward,
        'b' => Motion::WordBackward,
        'e' => Motion::WordEnd,
        '0' => Motion::LineStart,
        '^' => Motion::FirstNonBlank,
        '$' => Motion::LineEnd,
        'G' => Motion::LastLine,
        _ => return None,
    })
}

fn operator_for(key: char) -> Option<Operator> {
    match key {
        'd' => Some(Operator::Delete),
        'c' => Some(Operator::Change),
        'y' => Some(Operator::Yank),
        _ => None,
    }
}

fn engine(command: VimCommand, consumed: usize) -> (Action<VimCommand>, usize) {
    (Action::Engine(command), consumed)
}

fn next_action(mode: Mode, input: &str) -> (Action<VimCommand>, usize) {
    for (name, motion) in SPECIAL_KEYS {
        if input.starts_with(name) {
            let command = match motion {
                Some(motion) => VimCommand::Extend { motion: *motion },
                None => VimCommand::Escape,
            };
            return engine(command, name.len());
        }
    }

    for (name, motion) in UNSHIFTED_KEYS {
        if input.starts_with(name) {
            return engine(VimCommand::Key { motion: *motion }, name.len());
        }
    }

    let mut chars = input.chars();
    let key = chars.next().unwrap();
    let next = chars.next();
    if mode == Mode::Insert || mode.is_select() {
        return engine(VimCommand::typed(key.to_string()), key.len_utf8());
    }

    if mode.is_visual()
        && let Some(operator) = operator_for(key)
    {
        return engine(VimCommand::VisualOperate(operator), 1);
    }

    match (key, next) {
        (':', _) => {
            let end = input.find("<CR>").unwrap();
            let line = input[1..end].parse().unwrap();
            engine(VimCommand::GotoLine(line), end + "<CR>".len())
        }
        ('u', _) => (Action::Undo, 1),
        ('.', _) => (Action::RepeatLastChange, 1),
        ('g', Some('g')) => engine(VimCommand::motion(Motion::FirstLine), 2),
        ('g', Some('h')) => engine(VimCommand::Select(VisualKind::Character), 2),
        ('g', Some('H')) => engine(VimCommand::Select(VisualKind::Line), 2),
        ('v', _) => engine(VimCommand::Visual(VisualKind::Character), 1),
        ('V', _) => engine(VimCommand::Visual(VisualKind::Line), 1),
        ('x', _) => engine(VimCommand::DeleteChar { count: 1 }, 1),
        ('p', _) => engine(VimCommand::Put { before: false, count: 1 }, 1),
        ('P', _) => engine(VimCommand::Put { before: true, count: 1 }, 1),
        ('i', _) => engine(insert(InsertEntry::Before), 1),
        ('a', _) => engine(insert(InsertEntry::After), 1),
        ('I', _) => engine(insert(InsertEntry::LineStart), 1),
        ('A', _) => engine(insert(InsertEntry::LineEnd), 1),
        (op, Some(second)) if operator_for(op).is_some() => {
            let operator = operator_for(op).unwrap();
            if second == op {
                return engine(VimCommand::OperateLines { operator, count: 1 }, 2);
            }
            let motion = motion_for(second).unwrap();
            engine(VimCommand::operate(operator, motion), 2)
        }
        (key, _) => engine(VimCommand::motion(motion_for(key).unwrap()), key.len_utf8()),
    }
}

fn insert(entry: InsertEntry) -> VimCommand {
    VimCommand::Insert { entry, count: 1 }
}
