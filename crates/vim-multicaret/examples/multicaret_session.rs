use tracing_subscriber::EnvFilter;
use vim_multicaret::{
    Action, CaretDirection, InsertEntry, Motion, MultiCaretSession, Operator, OverlayHost,
    SelectedSpan, Settings, VimCommand, VimEngine, VirtualPoint,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Settings::from_toml_str("selection = \"exclusive\"\nstart_of_line = false\n")
        .unwrap_or_default();
    let host = OverlayHost::new(SelectedSpan::caret(VirtualPoint::new(0, 4)));
    let mut session = MultiCaretSession::new(
        "let a = one;\nlet b = two;\nlet c = three;",
        VimEngine::new(),
        host,
        settings,
    );

    // One caret per line.
    session.process(Action::AddCaretOnLine(CaretDirection::Below));
    session.process(Action::AddCaretOnLine(CaretDirection::Below));
    println!("carets: {:?}", session.carets());

    // `cw` renames the variable at every caret.
    session.process(Action::Engine(VimCommand::operate(
        Operator::Change,
        Motion::WordForward,
    )));
    session.process(Action::Engine(VimCommand::typed("value")));
    session.process(Action::Engine(VimCommand::Escape));
    println!("{}", session.buffer().text());

    // `A` appends a comment at every line end, then `.` does it again.
    session.process(Action::Engine(VimCommand::Insert {
        entry: InsertEntry::LineEnd,
        count: 1,
    }));
    session.process(Action::Engine(VimCommand::typed(" // set")));
    session.process(Action::Engine(VimCommand::Escape));
    session.process(Action::RepeatLastChange);
    println!("{}", session.buffer().text());

    session.process(Action::Undo);
    session.process(Action::Undo);
    println!("after two undos:\n{}", session.buffer().text());
    println!("overlay redraws: {}", session.host().overlay_generation());
}
