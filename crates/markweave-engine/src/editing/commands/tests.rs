use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::models::{Document, Element};
use crate::test_support::*;

fn state(doc: Element, selection: Selection) -> EditorState {
    EditorState::new(Arc::new(Registry::standard()), Document::new(doc)).with_selection(selection)
}

fn apply(state: &EditorState, command: Command) -> EditorState {
    let tr = compile(state, &command).unwrap_or_else(|| panic!("{} rejected", command.name()));
    state.apply(tr)
}

#[test]
fn toggle_mark_adds_then_removes() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("hello world")])]), Selection::text(1, 6));

    let bold = apply(&start, Command::toggle_mark("bold"));
    assert_eq!(
        bold.doc().root(),
        &b.doc(vec![b.p(vec![b.marked("hello", &["bold"]), b.text(" world")])])
    );
    assert_eq!(bold.selection(), Selection::text(1, 6));

    let plain = apply(&bold, Command::toggle_mark("bold"));
    assert_eq!(plain.doc().root(), start.doc().root());
}

#[test]
fn toggle_mark_adds_when_only_part_is_marked() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.marked("ab", &["italic"]), b.text("cd")])]),
        Selection::text(1, 5),
    );
    let next = apply(&start, Command::toggle_mark("italic"));
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.marked("abcd", &["italic"])])]));
}

#[rstest]
#[case::empty_selection(Selection::cursor(2), "bold")]
#[case::unknown_mark(Selection::text(1, 3), "sparkle")]
fn toggle_mark_rejections(#[case] selection: Selection, #[case] mark: &str) {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("abc")])]), selection);
    assert!(compile(&start, &Command::toggle_mark(mark)).is_none());
}

#[test]
fn toggle_mark_skips_code_blocks() {
    let b = builder();
    let start = state(b.doc(vec![b.code_block(vec![b.text("let x")])]), Selection::text(1, 4));
    assert!(compile(&start, &Command::toggle_mark("bold")).is_none());
}

#[test]
fn clear_format_strips_every_mark() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.marked("a", &["bold", "italic"]), b.link("b", "https://x.io")])]),
        Selection::text(1, 3),
    );
    let next = apply(&start, Command::ClearFormat);
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.text("ab")])]));
}

#[test]
fn rejected_command_leaves_state_untouched() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("abc")])]), Selection::cursor(2));
    assert!(compile(&start, &Command::Lift).is_none());
    assert!(compile(&start, &Command::ToggleTask(0)).is_none());
    assert!(compile(&start, &Command::set_block_type("hardBreak", Attrs::new())).is_none());
}

#[test]
fn set_block_type_makes_a_heading_and_keeps_the_cursor() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.text("one")]), b.p(vec![b.text("two")])]),
        Selection::cursor(2),
    );
    let next = apply(&start, Command::heading(2));
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.h(2, vec![b.text("one")]), b.p(vec![b.text("two")])])
    );
    assert_eq!(next.selection(), Selection::cursor(2));
}

#[test]
fn set_block_type_to_the_same_markup_is_rejected() {
    let b = builder();
    let start = state(b.doc(vec![b.h(2, vec![b.text("one")])]), Selection::cursor(2));
    assert!(compile(&start, &Command::heading(2)).is_none());
}

#[test]
fn set_block_type_code_drops_marks() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.marked("x", &["bold"]), b.text("y")])]),
        Selection::cursor(1),
    );
    let next = apply(&start, Command::set_block_type("codeBlock", Attrs::new()));
    assert_eq!(next.doc().root(), &b.doc(vec![b.code_block(vec![b.text("xy")])]));
}

#[test]
fn wrap_in_blockquote_and_lift_back_out() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.text("a")]), b.p(vec![b.text("b")])]),
        Selection::text(1, 4),
    );
    let wrapped = apply(&start, Command::wrap_in("blockquote"));
    assert_eq!(
        wrapped.doc().root(),
        &b.doc(vec![b.bq(vec![b.p(vec![b.text("a")]), b.p(vec![b.text("b")])])])
    );
    assert_eq!(wrapped.selection(), Selection::text(2, 5));

    let lifted = apply(&wrapped, Command::Lift);
    assert_eq!(lifted.doc().root(), start.doc().root());
    assert_eq!(lifted.selection(), Selection::text(1, 4));
}

#[test]
fn toggle_list_wraps_then_unwraps() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("a")])]), Selection::cursor(1));
    let listed = apply(&start, Command::toggle_list("bulletList"));
    assert_eq!(
        listed.doc().root(),
        &b.doc(vec![b.ul(vec![b.li(vec![b.p(vec![b.text("a")])])])])
    );
    assert_eq!(listed.selection(), Selection::cursor(3));

    let unlisted = apply(&listed, Command::toggle_list("bulletList"));
    assert_eq!(unlisted.doc().root(), start.doc().root());
    assert_eq!(unlisted.selection(), Selection::cursor(1));
}

#[test]
fn toggle_list_swaps_kind_in_place() {
    let b = builder();
    let start = state(
        b.doc(vec![b.ul(vec![
            b.li(vec![b.p(vec![b.text("a")])]),
            b.li(vec![b.p(vec![b.text("b")])]),
        ])]),
        Selection::cursor(3),
    );
    let tasks = apply(&start, Command::toggle_list("taskList"));
    assert_eq!(
        tasks.doc().root(),
        &b.doc(vec![b.tasks(vec![
            b.task(false, vec![b.p(vec![b.text("a")])]),
            b.task(false, vec![b.p(vec![b.text("b")])]),
        ])])
    );

    let ordered = apply(&tasks, Command::toggle_list("orderedList"));
    assert_eq!(
        ordered.doc().root(),
        &b.doc(vec![b.ol(
            1,
            vec![b.li(vec![b.p(vec![b.text("a")])]), b.li(vec![b.p(vec![b.text("b")])])]
        )])
    );
}

#[test]
fn split_block_in_the_middle_keeps_the_kind() {
    let b = builder();
    let start = state(b.doc(vec![b.h(1, vec![b.text("hello")])]), Selection::cursor(3));
    let next = apply(&start, Command::SplitBlock);
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.h(1, vec![b.text("he")]), b.h(1, vec![b.text("llo")])])
    );
    assert_eq!(next.selection(), Selection::cursor(5));
}

#[test]
fn split_block_at_heading_end_starts_a_paragraph() {
    let b = builder();
    let start = state(b.doc(vec![b.h(1, vec![b.text("Title")])]), Selection::cursor(6));
    let next = apply(&start, Command::SplitBlock);
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.h(1, vec![b.text("Title")]), b.p(vec![])])
    );
    assert_eq!(next.selection(), Selection::cursor(8));
}

#[test]
fn split_block_in_a_task_adds_an_unchecked_task() {
    let b = builder();
    let start = state(
        b.doc(vec![b.tasks(vec![b.task(true, vec![b.p(vec![b.text("do")])])])]),
        Selection::cursor(5),
    );
    let next = apply(&start, Command::SplitBlock);
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.tasks(vec![
            b.task(true, vec![b.p(vec![b.text("do")])]),
            b.task(false, vec![b.p(vec![])]),
        ])])
    );
    assert_eq!(next.selection(), Selection::cursor(9));
}

#[test]
fn split_block_in_an_empty_item_leaves_the_list() {
    let b = builder();
    let start = state(
        b.doc(vec![b.ul(vec![b.li(vec![b.p(vec![b.text("a")])]), b.li(vec![b.p(vec![])])])]),
        Selection::cursor(8),
    );
    let next = apply(&start, Command::SplitBlock);
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.ul(vec![b.li(vec![b.p(vec![b.text("a")])])]), b.p(vec![])])
    );
    assert_eq!(next.selection(), Selection::cursor(8));
}

#[test]
fn split_block_in_code_inserts_a_newline() {
    let b = builder();
    let start = state(b.doc(vec![b.code_block(vec![b.text("ab")])]), Selection::cursor(2));
    let next = apply(&start, Command::SplitBlock);
    assert_eq!(next.doc().root(), &b.doc(vec![b.code_block(vec![b.text("a\nb")])]));
    assert_eq!(next.selection(), Selection::cursor(3));
}

#[test]
fn delete_selection_joins_blocks() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.text("ab")]), b.p(vec![b.text("cd")])]),
        Selection::text(2, 6),
    );
    let next = apply(&start, Command::DeleteSelection);
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.text("ad")])]));
    assert_eq!(next.selection(), Selection::cursor(2));
}

#[test]
fn deleting_the_only_block_leaves_an_empty_paragraph() {
    let b = builder();
    let start = state(b.doc(vec![b.hr()]), Selection::Node { pos: 0 });
    assert_eq!(start.selection(), Selection::Node { pos: 0 });
    let next = apply(&start, Command::DeleteSelection);
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![])]));
    assert_eq!(next.selection(), Selection::cursor(1));
}

#[test]
fn insert_text_replaces_the_selection() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("axc")])]), Selection::text(2, 3));
    let next = apply(&start, Command::InsertText("b".to_string()));
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.text("abc")])]));
    assert_eq!(next.selection(), Selection::cursor(3));
}

#[test]
fn insert_text_inherits_marks_at_the_cursor() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.marked("ab", &["bold"])])]), Selection::cursor(3));
    let next = apply(&start, Command::InsertText("c".to_string()));
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.marked("abc", &["bold"])])]));
}

#[test]
fn insert_block_content_mid_paragraph_splits_it() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("abcd")])]), Selection::cursor(1));
    let next = apply(
        &start,
        Command::InsertContentAt {
            pos: 3,
            content: Fragment::from_node(b.hr()),
        },
    );
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![b.p(vec![b.text("ab")]), b.hr(), b.p(vec![b.text("cd")])])
    );
}

#[test]
fn insert_block_content_replaces_an_empty_paragraph() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![])]), Selection::cursor(1));
    let next = apply(
        &start,
        Command::InsertContentAt {
            pos: 1,
            content: Fragment::from_node(b.h(2, vec![b.text("T")])),
        },
    );
    assert_eq!(next.doc().root(), &b.doc(vec![b.h(2, vec![b.text("T")])]));
    assert_eq!(next.selection(), Selection::cursor(2));
}

#[test]
fn toggle_task_flips_checked() {
    let b = builder();
    let start = state(
        b.doc(vec![b.tasks(vec![b.task(false, vec![b.p(vec![b.text("x")])])])]),
        Selection::cursor(3),
    );
    let done = apply(&start, Command::ToggleTask(1));
    assert_eq!(
        done.doc().root(),
        &b.doc(vec![b.tasks(vec![b.task(true, vec![b.p(vec![b.text("x")])])])])
    );
    let undone = apply(&done, Command::ToggleTask(1));
    assert_eq!(undone.doc().root(), start.doc().root());
}

#[test]
fn set_node_attr_merges() {
    let b = builder();
    let start = state(b.doc(vec![b.h(1, vec![b.text("x")])]), Selection::cursor(1));
    let next = apply(
        &start,
        Command::SetNodeAttr {
            pos: 0,
            attrs: attrs(&[("level", json!(3))]),
        },
    );
    assert_eq!(next.doc().root(), &b.doc(vec![b.h(3, vec![b.text("x")])]));
}

#[test]
fn duplicate_and_delete_block() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.text("a")]), b.p(vec![b.text("b")])]),
        Selection::cursor(1),
    );
    let duplicated = apply(&start, Command::DuplicateBlock(0));
    assert_eq!(
        duplicated.doc().root(),
        &b.doc(vec![
            b.p(vec![b.text("a")]),
            b.p(vec![b.text("a")]),
            b.p(vec![b.text("b")]),
        ])
    );

    let deleted = apply(&start, Command::DeleteBlock(0));
    assert_eq!(deleted.doc().root(), &b.doc(vec![b.p(vec![b.text("b")])]));
}

#[test]
fn delete_block_refills_an_emptied_document() {
    let b = builder();
    let start = state(b.doc(vec![b.p(vec![b.text("a")])]), Selection::cursor(1));
    let next = apply(&start, Command::DeleteBlock(0));
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![])]));
}

#[test]
fn move_block_down() {
    let b = builder();
    let start = state(
        b.doc(vec![
            b.p(vec![b.text("a")]),
            b.p(vec![b.text("b")]),
            b.p(vec![b.text("c")]),
        ]),
        Selection::cursor(1),
    );
    let next = apply(&start, Command::Move { from: 0, to: 3, target: 9 });
    assert_eq!(
        next.doc().root(),
        &b.doc(vec![
            b.p(vec![b.text("b")]),
            b.p(vec![b.text("c")]),
            b.p(vec![b.text("a")]),
        ])
    );
    assert_eq!(next.selection(), Selection::cursor(7));
}

#[test]
fn move_atom_keeps_it_selected() {
    let b = builder();
    let start = state(
        b.doc(vec![b.hr(), b.p(vec![b.text("a")])]),
        Selection::cursor(2),
    );
    let next = apply(&start, Command::Move { from: 0, to: 1, target: 4 });
    assert_eq!(next.doc().root(), &b.doc(vec![b.p(vec![b.text("a")]), b.hr()]));
    assert_eq!(next.selection(), Selection::Node { pos: 3 });
}

#[test]
fn move_onto_itself_is_rejected() {
    let b = builder();
    let start = state(
        b.doc(vec![b.p(vec![b.text("a")]), b.p(vec![b.text("b")])]),
        Selection::cursor(1),
    );
    assert!(compile(&start, &Command::Move { from: 0, to: 3, target: 3 }).is_none());
}

#[rstest]
#[case::before(6, 9, 0, Some(0))]
#[case::after(0, 3, 9, Some(6))]
#[case::inside(3, 9, 5, None)]
#[case::start_edge(3, 9, 3, None)]
#[case::end_edge(3, 9, 9, None)]
fn drop_positions(#[case] from: usize, #[case] to: usize, #[case] target: usize, #[case] expected: Option<usize>) {
    assert_eq!(drop_position(from, to, target), expected);
}

#[test]
fn insert_paragraph_after_moves_the_cursor_in() {
    let b = builder();
    let start = state(b.doc(vec![b.h(1, vec![b.text("T")])]), Selection::cursor(1));
    let next = apply(&start, Command::InsertParagraphAfter(0));
    assert_eq!(next.doc().root(), &b.doc(vec![b.h(1, vec![b.text("T")]), b.p(vec![])]));
    assert_eq!(next.selection(), Selection::cursor(4));
}

#[test]
fn ensure_trailing_paragraph_is_idempotent() {
    let b = builder();
    let start = state(b.doc(vec![b.h(1, vec![b.text("T")])]), Selection::cursor(1));
    let once = apply(&start, Command::EnsureTrailingParagraph);
    assert_eq!(once.doc().root(), &b.doc(vec![b.h(1, vec![b.text("T")]), b.p(vec![])]));
    assert_eq!(once.selection(), Selection::cursor(4));

    let twice = apply(&once, Command::EnsureTrailingParagraph);
    assert!(Document::ptr_eq(once.doc(), twice.doc()));
}
