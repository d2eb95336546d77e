use std::sync::Arc;
use std::time::{Duration, Instant};

use markweave_engine::affordance::{NodeBox, Phase};
use markweave_engine::{
    AffordanceConfig, Command, EditorSession, Effect, MenuItem, Point, Rect, Registry, Selection, ViewBinding,
    Viewport, parse,
};
use pretty_assertions::assert_eq;

/// "one" 0..5, "two" 5..10, "three" 10..17, stacked 20px apart.
fn session() -> EditorSession {
    let mut session = EditorSession::new(Arc::new(Registry::standard()), AffordanceConfig::default());
    assert!(session.load_markdown("one\n\ntwo\n\nthree\n"));
    session
}

fn binding() -> ViewBinding {
    ViewBinding::new(
        vec![
            NodeBox { pos: 0, rect: Rect::new(0.0, 0.0, 400.0, 20.0) },
            NodeBox { pos: 5, rect: Rect::new(0.0, 20.0, 400.0, 20.0) },
            NodeBox { pos: 10, rect: Rect::new(0.0, 40.0, 400.0, 20.0) },
        ],
        Viewport {
            rect: Rect::new(0.0, 0.0, 400.0, 60.0),
            scroll_top: 0.0,
            content_height: 60.0,
        },
    )
}

#[test]
fn dragging_a_block_equals_delete_then_insert() {
    let mut session = session();
    assert_eq!(session.pointer_move(&binding(), Point::new(-20.0, 5.0)), Some(0));
    session.pointer_down_handle();
    assert_eq!(session.selection(), Selection::text(1, 4));

    let effects = session.drag_start();
    let [Effect::Transfer(data)] = effects.as_slice() else {
        panic!("unexpected effects {effects:?}");
    };
    assert_eq!(data.plain, "one");

    assert!(session.drop(&binding(), Point::new(100.0, 55.0)).is_empty());
    assert_eq!(session.markdown(), "two\n\nthree\n\none\n");

    let registry = Registry::standard();
    let expected = parse(&registry, "two\n\nthree\n\none\n").expect("parses");
    assert_eq!(session.doc().root(), expected.root());
    assert_eq!(session.drain_events().len(), 1);
}

#[test]
fn dropping_back_in_place_changes_nothing() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 25.0));
    session.pointer_down_handle();
    session.drag_start();
    let before = session.doc().clone();
    session.drop(&binding(), Point::new(10.0, 22.0));
    assert!(markweave_engine::Document::ptr_eq(&before, session.doc()));
    assert_eq!(session.affordance().phase(), &Phase::Idle);
}

#[test]
fn menu_turns_a_block_into_a_heading() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 25.0));
    session.click_handle();
    let Phase::MenuOpen { items, .. } = session.affordance().phase() else {
        panic!("menu should be open");
    };
    assert_eq!(items.len(), 14);
    session.choose_menu_item(MenuItem::Heading(1));
    assert_eq!(session.markdown(), "one\n\n# two\n\nthree\n");
}

#[test]
fn menu_copy_hands_the_block_to_the_host() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 45.0));
    session.click_handle();
    let effects = session.choose_menu_item(MenuItem::CopyBlock);
    let [Effect::Copy(data)] = effects.as_slice() else {
        panic!("unexpected effects {effects:?}");
    };
    assert_eq!(data.plain, "three");
    assert!(session.drain_events().is_empty());
}

#[test]
fn plus_button_opens_a_paragraph_below() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 5.0));
    session.plus_button();
    assert_eq!(session.selection(), Selection::cursor(6));
    assert!(session.execute(Command::InsertText("new".to_string())));
    assert_eq!(session.markdown(), "one\n\nnew\n\ntwo\n\nthree\n");
}

#[test]
fn handle_hides_after_the_pointer_stays_away() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 5.0));
    let left = Instant::now();
    session.pointer_leave(left);
    session.tick(left + Duration::from_millis(299));
    assert_eq!(session.affordance().active_pos(), Some(0));
    session.tick(left + Duration::from_millis(300));
    assert_eq!(session.affordance().active_pos(), None);
}

#[test]
fn drag_released_outside_the_editor_is_abandoned() {
    let mut session = session();
    session.pointer_move(&binding(), Point::new(10.0, 25.0));
    session.pointer_down_handle();
    session.drag_start();
    let before = session.doc().clone();

    let left = Instant::now();
    session.pointer_leave(left);
    assert!(session.tick(left + Duration::from_secs(2)).is_empty());
    assert_eq!(session.affordance().phase(), &Phase::Idle);
    assert!(session.drop(&binding(), Point::new(100.0, 55.0)).is_empty());
    assert!(markweave_engine::Document::ptr_eq(&before, session.doc()));
    assert!(session.drain_events().is_empty());
}
