use proptest::prelude::*;
use std::collections::BTreeSet;
use vim_multicaret::{
    Action, Mode, MultiCaretSession, OffsetTranslator, OverlayHost, RopeBuffer, SelectedSpan,
    SelectionHost, Settings, TextBuffer, VimCommand, VimEngine, VirtualPoint,
};

fn point_strategy() -> impl Strategy<Value = VirtualPoint> {
    (0usize..6, 0usize..40).prop_map(|(line, column)| VirtualPoint::new(line, column))
}

// Exclusive-form spans with a selection: the caret sits on the active end.
fn selection_strategy() -> impl Strategy<Value = SelectedSpan> {
    (point_strategy(), point_strategy())
        .prop_filter("needs a selection", |(anchor, active)| anchor != active)
        .prop_map(|(anchor, active)| SelectedSpan::selection(anchor, active))
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-c \n]{0,60}"
}

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z ]{1,12}", 1..8)
}

proptest! {
    #[test]
    fn prop_end_adjustment_round_trips(span in selection_strategy()) {
        let adjusted = span.adjust_end_for_inclusive();
        prop_assert_eq!(adjusted.unadjust_end_for_inclusive(), span);
        prop_assert_eq!(adjusted.is_reversed(), span.is_reversed());
    }

    #[test]
    fn prop_caret_adjustment_round_trips(span in selection_strategy()) {
        let adjusted = span.adjust_caret_for_inclusive();
        prop_assert_eq!(adjusted.unadjust_caret_for_inclusive(), span);
        prop_assert_eq!(adjusted.anchor, span.anchor);
        prop_assert_eq!(adjusted.active, span.active);
    }

    #[test]
    fn prop_translated_points_match_translated_offsets(
        text in text_strategy(),
        a in 0usize..80,
        b in 0usize..80,
        inserted in "[xy\n]{0,5}",
    ) {
        let before = RopeBuffer::new(&text);
        let len = before.char_count();
        let (start, end) = (a.min(b).min(len), a.max(b).min(len));

        let mut after = before.clone();
        let change = after.replace(start, end, &inserted).unwrap();
        let translator = OffsetTranslator::new(change);

        for offset in 0..=len {
            let point = before.offset_to_point(offset).unwrap();
            let moved = translator.translate_point(point);
            prop_assert_eq!(after.point_to_offset(moved), translator.translate_offset(offset));
        }
    }

    #[test]
    fn prop_added_carets_stay_unique_and_primary_matches_host(
        lines in lines_strategy(),
        clicks in prop::collection::vec((0usize..8, 0usize..12), 0..12),
    ) {
        let buffer = RopeBuffer::from_lines(&lines);
        let host = OverlayHost::new(SelectedSpan::caret(VirtualPoint::new(0, 0)));
        let mut session =
            MultiCaretSession::new(&buffer.text(), VimEngine::new(), host, Settings::default());

        for (line, column) in clicks {
            let point = buffer.clamp_point(VirtualPoint::new(line, column));
            session.process(Action::AddCaret(point));
        }

        let carets = session.carets();
        let unique: BTreeSet<_> = carets.iter().copied().collect();
        prop_assert_eq!(unique.len(), carets.len());
        prop_assert!(!carets.is_empty());
        prop_assert_eq!(session.host().native_selection(), session.selected_spans()[0]);
        prop_assert_eq!(session.host().secondary_spans(), session.tracker().secondaries());
    }

    #[test]
    fn prop_insert_at_every_caret_then_undo(
        lines in lines_strategy(),
        raw_carets in prop::collection::vec((0usize..8, 0usize..12), 1..6),
    ) {
        let buffer = RopeBuffer::from_lines(&lines);
        let original = buffer.text();
        let carets: Vec<VirtualPoint> = raw_carets
            .iter()
            .map(|&(line, column)| {
                let point = buffer.clamp_point(VirtualPoint::new(line, column));
                let last = buffer.line_len(point.line).saturating_sub(1);
                point.with_column(point.column.min(last))
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let host = OverlayHost::new(SelectedSpan::caret(carets[0]));
        let mut session =
            MultiCaretSession::new(&original, VimEngine::new(), host, Settings::default());
        session.set_carets(&carets);

        session.process(Action::Engine(VimCommand::Insert {
            entry: vim_multicaret::InsertEntry::Before,
            count: 1,
        }));
        session.process(Action::Engine(VimCommand::typed("#")));
        session.process(Action::Engine(VimCommand::Escape));

        let text = session.buffer().text();
        prop_assert_eq!(text.matches('#').count(), carets.len());
        prop_assert_eq!(session.mode(), Mode::Normal);
        for caret in session.carets() {
            prop_assert_eq!(session.buffer().char_at(caret), Some('#'));
        }

        session.process(Action::Undo);
        prop_assert_eq!(session.buffer().text(), original);
        prop_assert_eq!(session.carets(), carets);
    }
}
