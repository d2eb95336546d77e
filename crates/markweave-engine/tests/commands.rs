use std::sync::Arc;

use markweave_engine::models::{Attrs, Document};
use markweave_engine::{AffordanceConfig, Command, EditorSession, Registry, Selection};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn session(markdown: &str) -> EditorSession {
    let mut session = EditorSession::new(Arc::new(Registry::standard()), AffordanceConfig::default());
    assert!(session.load_markdown(markdown));
    session
}

fn selection_is_valid(session: &EditorSession) -> bool {
    session.selection().validate(session.doc()) == session.selection()
}

#[rstest]
#[case::heading("para\n", Command::heading(2), "## para\n")]
#[case::bullet_list("a\n", Command::toggle_list("bulletList"), "- a\n")]
#[case::unwrap_list("- a\n", Command::toggle_list("bulletList"), "a\n")]
#[case::swap_list("- a\n", Command::toggle_list("orderedList"), "1. a\n")]
#[case::task_list("- a\n", Command::toggle_list("taskList"), "- [ ] a\n")]
#[case::quote("a\n", Command::wrap_in("blockquote"), "> a\n")]
#[case::code("a\n", Command::set_block_type("codeBlock", Attrs::new()), "```\na\n```\n")]
fn block_commands(#[case] markdown: &str, #[case] command: Command, #[case] expected: &str) {
    let mut session = session(markdown);
    assert!(session.execute(command));
    assert_eq!(session.markdown(), expected);
    assert!(selection_is_valid(&session));
}

#[test]
fn toggling_a_task_checks_it() {
    let mut session = session("- [ ] a\n");
    assert!(session.execute(Command::ToggleTask(1)));
    assert_eq!(session.markdown(), "- [x] a\n");
}

#[test]
fn bold_toggle_round_trips_to_markdown() {
    let mut session = session("make it loud\n");
    session.set_selection(Selection::text(9, 13));
    assert!(session.execute(Command::toggle_mark("bold")));
    assert_eq!(session.markdown(), "make it **loud**\n");
    assert!(session.execute(Command::toggle_mark("bold")));
    assert_eq!(session.markdown(), "make it loud\n");
}

#[test]
fn enter_splits_and_keeps_typing_in_the_new_block() {
    let mut session = session("# Title\n");
    session.set_selection(Selection::cursor(6));
    assert!(session.execute(Command::SplitBlock));
    assert!(session.execute(Command::InsertText("body".to_string())));
    assert_eq!(session.markdown(), "# Title\n\nbody\n");
}

#[rstest]
#[case::unknown_kind(Command::set_block_type("table", Attrs::new()))]
#[case::unknown_mark(Command::toggle_mark("blink"))]
#[case::lift_top_level(Command::Lift)]
#[case::task_on_paragraph(Command::ToggleTask(0))]
#[case::move_onto_itself(Command::Move { from: 0, to: 5, target: 5 })]
#[case::delete_out_of_range(Command::DeleteBlock(400))]
fn invalid_commands_leave_the_document_untouched(#[case] command: Command) {
    let mut session = session("abc\n\ndef\n");
    let before = session.doc().clone();
    assert!(!session.execute(command));
    assert!(Document::ptr_eq(&before, session.doc()));
    assert!(session.drain_events().is_empty());
}

#[test]
fn selection_stays_valid_through_a_mixed_edit_sequence() {
    let mut session = session("# One\n\n- a\n- b\n\n---\n\ntail\n");
    let commands = [
        Command::DeleteBlock(0),
        Command::SplitBlock,
        Command::InsertText("x".to_string()),
        Command::toggle_list("orderedList"),
        Command::DeleteSelection,
        Command::EnsureTrailingParagraph,
        Command::Lift,
        Command::DuplicateBlock(0),
    ];
    for command in commands {
        session.execute(command);
        assert!(selection_is_valid(&session), "invalid selection {:?}", session.selection());
    }
}

#[test]
fn versions_increase_once_per_change() {
    let mut session = session("a\n");
    session.set_selection(Selection::cursor(2));
    session.execute(Command::InsertText("b".to_string()));
    session.execute(Command::Lift);
    session.execute(Command::InsertText("c".to_string()));
    let versions: Vec<u64> = session.drain_events().iter().map(|e| e.version).collect();
    assert_eq!(versions, [1, 2]);
}

#[rstest]
#[case::wrap_rule("a\n\n---\n", Command::wrap_in("blockquote"))]
#[case::wrap_embed("a\n\n::agent{agent={\"id\":\"1\"}}\n", Command::wrap_in("blockquote"))]
#[case::list_rule("a\n\n---\n", Command::toggle_list("bulletList"))]
#[case::list_embed("a\n\n::agent{agent={\"id\":\"1\"}}\n", Command::toggle_list("taskList"))]
#[case::retype_rule("a\n\n---\n", Command::heading(1))]
fn atoms_cannot_be_restructured(#[case] markdown: &str, #[case] command: Command) {
    let mut session = session(markdown);
    let atom = Selection::node(session.doc(), 3).expect("atom at 3");
    session.set_selection(atom);
    assert_eq!(session.selection(), atom);

    let before = session.doc().clone();
    assert!(!session.execute(command));
    assert!(Document::ptr_eq(&before, session.doc()));
    assert_eq!(session.markdown(), markdown);
    assert!(session.drain_events().is_empty());
}
