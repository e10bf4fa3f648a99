mod support;

use support::{carets, keys, p, session_with};
use vim_multicaret::{Action, Mode, SelectedSpan, Settings, VirtualPoint, VisualKind};

const LINES: &[&str] = &["abc def ghi", "jkl mno pqr", ""];
const WORDS: &[&str] = &["abc def ghi jkl", "mno pqr stu vwx", ""];

fn select_settings(selection: &str) -> Settings {
    let mut settings = Settings::default();
    for option in [selection, "selectmode=mouse,key", "keymodel=startsel"] {
        settings.apply_option(option).unwrap();
    }
    settings
}

fn on_both_lines(caret: usize, start: isize, end: isize, reversed: bool) -> Vec<SelectedSpan> {
    (0..2)
        .map(|line| {
            SelectedSpan::from_offsets(VirtualPoint::new(line, caret), start, end, reversed)
        })
        .collect()
}

#[test]
fn test_shifted_key_enters_select_mode() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 0), (1, 0)], settings);
    keys(&mut session, "<S-Right>");
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    assert_eq!(session.selected_spans(), on_both_lines(1, -1, 0, false));
}

#[test]
fn test_shifted_key_without_select_mode_enters_visual() {
    let mut settings = Settings::default();
    settings.apply_option("keymodel=startsel").unwrap();
    let mut session = session_with(LINES, &[(0, 0), (1, 0)], settings);
    keys(&mut session, "<S-Right>");
    assert_eq!(session.mode(), Mode::Visual(VisualKind::Character));
}

#[test]
fn test_shifted_key_without_keymodel_moves() {
    let mut session = session_with(LINES, &[(0, 0), (1, 0)], Settings::default());
    keys(&mut session, "<S-Right>");
    assert_eq!(session.mode(), Mode::Normal);
    assert_eq!(carets(&session), vec![p(0, 1), p(1, 1)]);
}

#[test]
fn test_typing_replaces_selection() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right>xxx ");
    assert_eq!(session.lines(), vec!["abc xxx ghi", "jkl xxx pqr", ""]);
    assert_eq!(carets(&session), vec![p(0, 8), p(1, 8)]);
    assert_eq!(session.mode(), Mode::Insert);
}

#[test]
fn test_extend_forward() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right>");
    assert_eq!(session.selected_spans(), on_both_lines(8, -4, 0, false));
}

#[test]
fn test_extend_backward() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 8), (1, 8)], settings);
    keys(&mut session, "gh<C-S-Left>");
    assert_eq!(session.selected_spans(), on_both_lines(4, 0, 4, true));
}

#[test]
fn test_extend_through_zero_width() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right><C-S-Left><C-S-Left>");
    assert_eq!(session.selected_spans(), on_both_lines(0, 0, 4, true));
}

#[test]
fn test_inclusive_select_caret_sits_on_last_character() {
    let settings = select_settings("selection=inclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right>");
    assert_eq!(
        session.selected_spans()[0],
        SelectedSpan::new(p(0, 7), p(0, 4), p(0, 8))
    );

    // typing still replaces exactly the selected word and its trailing blank
    keys(&mut session, "X");
    assert_eq!(session.lines(), vec!["abc Xghi", "jkl Xpqr", ""]);
}

#[test]
fn test_escape_from_select_returns_to_normal() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right><Esc>");
    assert_eq!(session.mode(), Mode::Normal);
    assert_eq!(carets(&session), vec![p(0, 8), p(1, 8)]);
}

#[test]
fn test_replace_selection_is_one_undo_step() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right>xxx <Esc>u");
    assert_eq!(session.lines(), LINES.to_vec());
}

#[test]
fn test_unshifted_key_with_stopsel_leaves_select_mode() {
    let mut settings = select_settings("selection=exclusive");
    settings.apply_option("keymodel=startsel,stopsel").unwrap();
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right><Right>");
    assert_eq!(session.mode(), Mode::Normal);
    assert_eq!(carets(&session), vec![p(0, 9), p(1, 9)]);
    assert!(session.selected_spans().iter().all(SelectedSpan::is_empty));
}

#[test]
fn test_unshifted_key_without_stopsel_extends() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "gh<C-S-Right><Right>");
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    assert_eq!(session.selected_spans(), on_both_lines(9, -5, 0, false));
}

#[test]
fn test_visual_commands_enter_select_with_cmd() {
    let mut settings = Settings::default();
    settings.apply_option("selectmode=cmd").unwrap();
    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings.clone());
    keys(&mut session, "v");
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));

    let mut session = session_with(LINES, &[(0, 4), (1, 4)], settings);
    keys(&mut session, "V");
    assert_eq!(session.mode(), Mode::Select(VisualKind::Line));
}

#[test]
fn test_exclusive_double_click_selects_words() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(WORDS, &[(0, 0)], settings);

    session.process(Action::SelectWord(p(0, 5)));
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    let first = SelectedSpan::from_offsets(p(0, 7), -3, 0, false);
    assert_eq!(session.selected_spans(), vec![first]);

    session.process(Action::AddWordSelection(p(1, 9)));
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    let second = SelectedSpan::from_offsets(p(1, 11), -3, 0, false);
    assert_eq!(session.selected_spans(), vec![first, second]);

    keys(&mut session, "X");
    assert_eq!(session.lines(), vec!["abc X ghi jkl", "mno pqr X vwx", ""]);
}

#[test]
fn test_inclusive_double_click_selects_words() {
    let settings = select_settings("selection=inclusive");
    let mut session = session_with(WORDS, &[(0, 0)], settings);

    session.process(Action::SelectWord(p(0, 5)));
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    let first = SelectedSpan::from_offsets(p(0, 6), -2, 1, false);
    assert_eq!(session.selected_spans(), vec![first]);

    session.process(Action::AddWordSelection(p(1, 9)));
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    let second = SelectedSpan::from_offsets(p(1, 10), -2, 1, false);
    assert_eq!(session.selected_spans(), vec![first, second]);
}

#[test]
fn test_double_click_on_selected_word_beeps() {
    let settings = select_settings("selection=inclusive");
    let mut session = session_with(WORDS, &[(0, 0)], settings);
    session.process(Action::SelectWord(p(0, 5)));
    session.process(Action::AddWordSelection(p(0, 4)));
    assert_eq!(session.selected_spans().len(), 1);
    assert_eq!(session.host().beep_count(), 1);
}

#[test]
fn test_double_click_without_mouse_selectmode_enters_visual() {
    let mut session = session_with(WORDS, &[(0, 0)], Settings::default());
    session.process(Action::SelectWord(p(0, 5)));
    assert_eq!(session.mode(), Mode::Visual(VisualKind::Character));
    assert_eq!(
        session.selected_spans(),
        vec![SelectedSpan::from_offsets(p(0, 6), -2, 1, false)]
    );

    keys(&mut session, "d");
    assert_eq!(session.lines()[0], "abc  ghi jkl");
    assert_eq!(carets(&session), vec![p(0, 4)]);
}

#[test]
fn test_double_click_ends_insert_session() {
    let settings = select_settings("selection=exclusive");
    let mut session = session_with(LINES, &[(0, 4)], settings);
    keys(&mut session, "ixx");
    assert_eq!(session.lines()[0], "abc xxdef ghi");

    session.process(Action::SelectWord(p(0, 1)));
    assert_eq!(session.mode(), Mode::Select(VisualKind::Character));
    keys(&mut session, "<Esc>u");
    assert_eq!(session.lines(), LINES.to_vec());
}
