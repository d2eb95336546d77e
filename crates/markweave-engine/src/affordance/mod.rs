//! # Block Affordances
//!
//! The drag handle, its menu and the plus button, as a state machine fed by
//! pointer input.
//!
//! ```text
//!  Idle ──move──▶ Hovering(pos) ──down──▶ Armed(pos) ──drag──▶ Dragging ──drop──▶ Idle
//!    ▲                 │                      │
//!    │                 └────────click─────────┴──────▶ MenuOpen ──close/choose──▶ Idle
//!    └──── leave + grace period ────┘
//! ```
//!
//! The machine never touches the document. Each input returns [`Effect`]s
//! for the owner to apply, so everything here is testable without a view.
//! Time only enters through explicit [`Instant`] arguments.

pub mod autoscroll;
pub mod menu;
pub mod view;

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::clipboard::{self, ClipboardData};
use crate::editing::commands::drop_position;
use crate::editing::selection::textblock_spans;
use crate::editing::{Command, EditorState, Selection};
use crate::models::{Document, Element, Node, Slice};

pub use menu::{MenuItem, menu_items};
pub use view::{NodeBox, Point, Rect, ViewBinding, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub struct AffordanceConfig {
    /// How long the pointer may stay outside before the handle hides.
    pub grace_period: Duration,
    pub scroll_edge: f64,
    pub scroll_step: f64,
    /// Hover hit-tests probe this far right so the gutter finds its block.
    pub hover_probe: f64,
    /// Kinds that never get a handle; hovering them picks their parent.
    pub disabled_kinds: BTreeSet<String>,
}

impl Default for AffordanceConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(300),
            scroll_edge: 20.0,
            scroll_step: 10.0,
            hover_probe: 70.0,
            disabled_kinds: BTreeSet::new(),
        }
    }
}

/// A drag in progress. Positions refer to `doc`; any other document at
/// drop time cancels the drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOrigin {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
    doc: Document,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Hovering { pos: usize },
    Armed { pos: usize },
    Dragging(DragOrigin),
    MenuOpen { pos: usize, items: Vec<MenuItem> },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Hovering { .. } => "hovering",
            Phase::Armed { .. } => "armed",
            Phase::Dragging(_) => "dragging",
            Phase::MenuOpen { .. } => "menuOpen",
        }
    }
}

/// What the owner of the editor state should do in response to an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Select(Selection),
    Run(Command),
    /// Put this on the system clipboard.
    Copy(ClipboardData),
    /// Hand this to the host's drag data transfer.
    Transfer(ClipboardData),
    /// Scroll the container by this many pixels.
    Scroll(f64),
    /// Turn a pinned node selection back into a text selection.
    Release,
}

#[derive(Debug, Default)]
pub struct Affordance {
    config: AffordanceConfig,
    phase: Phase,
    left_at: Option<Instant>,
}

impl Affordance {
    pub fn new(config: AffordanceConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            left_at: None,
        }
    }

    pub fn config(&self) -> &AffordanceConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The block the handle is attached to.
    pub fn active_pos(&self) -> Option<usize> {
        position_of(&self.phase)
    }

    fn transition(&mut self, next: Phase) {
        if self.phase.name() != next.name() || self.active_pos() != position_of(&next) {
            trace!(from = self.phase.name(), to = next.name(), pos = ?position_of(&next), "affordance transition");
        }
        self.phase = next;
    }

    /// Track the hovered block. Returns the block the handle sits beside.
    pub fn pointer_move(&mut self, doc: &Element, binding: &ViewBinding, point: Point) -> Option<usize> {
        self.left_at = None;
        if matches!(self.phase, Phase::Idle | Phase::Hovering { .. })
            && let Some(hit) = binding.hit(point, self.config.hover_probe)
            && let Some(pos) = hover_target(doc, hit, &self.config.disabled_kinds)
        {
            self.transition(Phase::Hovering { pos });
        }
        self.active_pos()
    }

    /// Pointer pressed on the handle: pin a selection on the hovered block.
    pub fn pointer_down_handle(&mut self, state: &EditorState) -> Vec<Effect> {
        let Phase::Hovering { pos } = self.phase else {
            return Vec::new();
        };
        match pin(state.doc(), pos) {
            Some(selection) => {
                self.transition(Phase::Armed { pos });
                vec![Effect::Select(selection)]
            }
            None => Vec::new(),
        }
    }

    /// A click on the handle toggles the block menu.
    pub fn click_handle(&mut self, state: &EditorState) -> Vec<Effect> {
        match self.phase {
            Phase::MenuOpen { .. } => self.close_menu(),
            Phase::Hovering { pos } | Phase::Armed { pos } => {
                let Some(block) = block_at(state.doc(), pos) else {
                    return Vec::new();
                };
                let Some(selection) = pin(state.doc(), pos) else {
                    return Vec::new();
                };
                let items = menu_items(state.registry(), &block);
                self.transition(Phase::MenuOpen { pos, items });
                vec![Effect::Select(selection)]
            }
            Phase::Idle | Phase::Dragging(_) => Vec::new(),
        }
    }

    pub fn close_menu(&mut self) -> Vec<Effect> {
        if !matches!(self.phase, Phase::MenuOpen { .. }) {
            return Vec::new();
        }
        self.transition(Phase::Idle);
        vec![Effect::Release]
    }

    /// Run a menu item on the block the menu was opened for.
    pub fn choose_menu_item(&mut self, state: &EditorState, item: MenuItem) -> Vec<Effect> {
        let Phase::MenuOpen { pos, items } = &self.phase else {
            return Vec::new();
        };
        let pos = *pos;
        if item == MenuItem::Separator || !items.contains(&item) {
            return Vec::new();
        }
        let action = match item {
            MenuItem::CopyBlock => block_slice(state.doc(), pos)
                .map(|slice| Effect::Copy(clipboard::slice_data(state.registry(), &slice))),
            MenuItem::DeleteBlock => Some(Effect::Run(Command::DeleteBlock(pos))),
            other => other.command().map(Effect::Run),
        };
        self.transition(Phase::Idle);
        action.into_iter().chain([Effect::Release]).collect()
    }

    /// Start dragging the armed (or hovered) block.
    pub fn drag_start(&mut self, state: &EditorState) -> Vec<Effect> {
        let pos = match self.phase {
            Phase::Hovering { pos } | Phase::Armed { pos } => pos,
            _ => return Vec::new(),
        };
        let doc = state.doc();
        let (Some(selection), Some(slice)) = (pin(doc, pos), block_slice(doc, pos)) else {
            return Vec::new();
        };
        let data = clipboard::slice_data(state.registry(), &slice);
        let origin = DragOrigin {
            from: pos,
            to: pos + slice.content.size(),
            slice,
            doc: doc.clone(),
        };
        self.transition(Phase::Dragging(origin));
        vec![Effect::Select(selection), Effect::Transfer(data)]
    }

    /// Auto-scroll while dragging near the container edges.
    pub fn drag_over(&mut self, binding: &ViewBinding, point: Point) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Dragging(_)) {
            return Vec::new();
        }
        let delta = autoscroll::scroll_delta(
            &binding.viewport(),
            point,
            self.config.scroll_edge,
            self.config.scroll_step,
        );
        if delta == 0.0 { Vec::new() } else { vec![Effect::Scroll(delta)] }
    }

    /// Finish a drag at `point`. Dropping inside the origin, or after the
    /// document changed underneath the drag, moves nothing.
    pub fn drop(&mut self, doc: &Document, binding: &ViewBinding, point: Point) -> Vec<Effect> {
        let Phase::Dragging(origin) = &self.phase else {
            return Vec::new();
        };
        let origin = origin.clone();
        self.transition(Phase::Idle);
        if !Document::ptr_eq(doc, &origin.doc) {
            trace!("document changed during drag, dropping nothing");
            return vec![Effect::Release];
        }
        let target = binding
            .pos_at(doc, point, self.config.hover_probe)
            .and_then(|target| sibling_boundary(doc, binding, origin.from, target, point));
        match target {
            Some(target) if drop_position(origin.from, origin.to, target).is_some() => vec![
                Effect::Run(Command::Move {
                    from: origin.from,
                    to: origin.to,
                    target,
                }),
                Effect::Release,
            ],
            _ => vec![Effect::Release],
        }
    }

    /// Abandon a drag without moving anything.
    pub fn cancel(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Dragging(_) | Phase::MenuOpen { .. } | Phase::Armed { .. } => {
                self.transition(Phase::Idle);
                vec![Effect::Release]
            }
            Phase::Idle | Phase::Hovering { .. } => Vec::new(),
        }
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        if matches!(self.phase, Phase::Hovering { .. } | Phase::Armed { .. } | Phase::Dragging(_)) {
            self.left_at = Some(now);
        }
    }

    pub fn pointer_enter(&mut self, _now: Instant) {
        self.left_at = None;
    }

    /// Hide the handle once the pointer has stayed away for the grace period.
    /// A drag that left the surface without dropping is abandoned.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let Some(left_at) = self.left_at else {
            return Vec::new();
        };
        if now.saturating_duration_since(left_at) < self.config.grace_period {
            return Vec::new();
        }
        self.left_at = None;
        match self.phase {
            Phase::Hovering { .. } => {
                self.transition(Phase::Idle);
                Vec::new()
            }
            Phase::Armed { .. } | Phase::Dragging(_) => {
                self.transition(Phase::Idle);
                vec![Effect::Release]
            }
            Phase::Idle | Phase::MenuOpen { .. } => Vec::new(),
        }
    }

    /// Insert an empty paragraph after the hovered block.
    pub fn plus_button(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Hovering { pos } | Phase::Armed { pos } => {
                vec![Effect::Run(Command::InsertParagraphAfter(pos))]
            }
            _ => Vec::new(),
        }
    }
}

fn position_of(phase: &Phase) -> Option<usize> {
    match phase {
        Phase::Idle => None,
        Phase::Hovering { pos } | Phase::Armed { pos } | Phase::MenuOpen { pos, .. } => Some(*pos),
        Phase::Dragging(origin) => Some(origin.from),
    }
}

/// Climb from the node at `pos` to the block the handle belongs to: skip
/// inline nodes, disabled kinds, and first children of anything but the
/// document, so the first line of a list grabs the whole list.
fn hover_target(doc: &Element, pos: usize, disabled: &BTreeSet<String>) -> Option<usize> {
    let rp = doc.resolve(pos).ok()?;
    let after = rp.node_after();
    let mut level = rp.depth() + 1;
    while level > 0 {
        let parent_depth = level - 1;
        let (node, at) = if level > rp.depth() {
            match after.as_ref().and_then(Node::as_element) {
                Some(el) => (el, rp.pos()),
                None => {
                    level -= 1;
                    continue;
                }
            }
        } else {
            (rp.node(level), rp.before(level))
        };
        let first_child = rp.index(parent_depth) == 0 && parent_depth > 0;
        if node.ty().is_block() && !disabled.contains(node.kind_name()) && !first_child {
            return Some(at);
        }
        level -= 1;
    }
    None
}

fn block_at(doc: &Element, pos: usize) -> Option<Element> {
    match doc.resolve(pos).ok()?.node_after()? {
        Node::Element(el) if el.ty().is_block() => Some((*el).clone()),
        _ => None,
    }
}

fn block_slice(doc: &Element, pos: usize) -> Option<Slice> {
    let block = block_at(doc, pos)?;
    doc.slice(pos, pos + block.node_size()).ok()
}

/// Atoms are node-selected; other blocks get their whole text selected.
fn pin(doc: &Element, pos: usize) -> Option<Selection> {
    let block = block_at(doc, pos)?;
    if block.ty().is_atom() {
        return Selection::node(doc, pos);
    }
    let end = pos + block.node_size();
    let spans: Vec<(usize, usize)> = textblock_spans(doc)
        .into_iter()
        .filter(|(start, stop)| *start > pos && *stop < end)
        .collect();
    match (spans.first(), spans.last()) {
        (Some((start, _)), Some((_, stop))) => Some(Selection::text(*start, *stop)),
        _ => Selection::node(doc, pos),
    }
}

/// Lift a drop boundary nested deeper than the origin up to the origin's
/// container, picking the side of the enclosing block the point is on.
fn sibling_boundary(doc: &Element, binding: &ViewBinding, from: usize, target: usize, point: Point) -> Option<usize> {
    let origin_depth = doc.resolve(from).ok()?.depth();
    let rp = doc.resolve(target).ok()?;
    if rp.depth() <= origin_depth {
        return Some(target);
    }
    let level = origin_depth + 1;
    let before = rp.before(level);
    let upper = binding
        .rect(before)
        .is_none_or(|rect| point.y < rect.center_y());
    Some(if upper { before } else { rp.after(level) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// one(0..5) two(5..10) hr(10..11) list(11..21): item a(12..16), item b(16..20)
    fn state() -> EditorState {
        let b = builder();
        let doc = b.doc(vec![
            b.p(vec![b.text("one")]),
            b.p(vec![b.text("two")]),
            b.hr(),
            b.ul(vec![b.li(vec![b.p(vec![b.text("a")])]), b.li(vec![b.p(vec![b.text("b")])])]),
        ]);
        EditorState::new(Arc::new(Registry::standard()), Document::new(doc))
    }

    fn binding() -> ViewBinding {
        ViewBinding::new(
            vec![
                NodeBox { pos: 0, rect: Rect::new(0.0, 0.0, 400.0, 20.0) },
                NodeBox { pos: 5, rect: Rect::new(0.0, 20.0, 400.0, 20.0) },
                NodeBox { pos: 10, rect: Rect::new(0.0, 40.0, 400.0, 10.0) },
                NodeBox { pos: 11, rect: Rect::new(0.0, 50.0, 400.0, 40.0) },
                NodeBox { pos: 12, rect: Rect::new(20.0, 50.0, 380.0, 20.0) },
                NodeBox { pos: 13, rect: Rect::new(40.0, 50.0, 360.0, 20.0) },
                NodeBox { pos: 16, rect: Rect::new(20.0, 70.0, 380.0, 20.0) },
                NodeBox { pos: 17, rect: Rect::new(40.0, 70.0, 360.0, 20.0) },
            ],
            Viewport {
                rect: Rect::new(0.0, 0.0, 400.0, 100.0),
                scroll_top: 50.0,
                content_height: 1000.0,
            },
        )
    }

    fn hovering(state: &EditorState, point: Point) -> Affordance {
        let mut machine = Affordance::default();
        machine.pointer_move(state.doc(), &binding(), point);
        machine
    }

    #[test]
    fn gutter_hover_finds_the_block() {
        let state = state();
        let mut machine = Affordance::default();
        assert_eq!(machine.pointer_move(state.doc(), &binding(), Point::new(-30.0, 25.0)), Some(5));
        assert_eq!(machine.phase(), &Phase::Hovering { pos: 5 });
    }

    #[test]
    fn first_list_line_grabs_the_whole_list() {
        let state = state();
        assert_eq!(hovering(&state, Point::new(100.0, 55.0)).active_pos(), Some(11));
        assert_eq!(hovering(&state, Point::new(100.0, 75.0)).active_pos(), Some(16));
    }

    #[test]
    fn disabled_kinds_defer_to_their_parent() {
        let state = state();
        let config = AffordanceConfig {
            disabled_kinds: ["listItem".to_string()].into_iter().collect(),
            ..AffordanceConfig::default()
        };
        let mut machine = Affordance::new(config);
        assert_eq!(machine.pointer_move(state.doc(), &binding(), Point::new(100.0, 75.0)), Some(11));
    }

    #[test]
    fn pinning_selects_text_or_the_atom() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 5.0));
        assert_eq!(machine.pointer_down_handle(&state), [Effect::Select(Selection::text(1, 4))]);
        assert_eq!(machine.phase(), &Phase::Armed { pos: 0 });

        let mut machine = hovering(&state, Point::new(10.0, 45.0));
        assert_eq!(machine.pointer_down_handle(&state), [Effect::Select(Selection::Node { pos: 10 })]);

        let mut machine = hovering(&state, Point::new(100.0, 55.0));
        assert_eq!(machine.pointer_down_handle(&state), [Effect::Select(Selection::text(14, 19))]);
    }

    #[test]
    fn atom_menu_deletes_the_block() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 45.0));
        machine.click_handle(&state);
        assert_eq!(
            machine.phase(),
            &Phase::MenuOpen {
                pos: 10,
                items: vec![MenuItem::CopyBlock, MenuItem::DeleteBlock]
            }
        );
        assert!(machine.choose_menu_item(&state, MenuItem::Heading(1)).is_empty());
        assert_eq!(
            machine.choose_menu_item(&state, MenuItem::DeleteBlock),
            [Effect::Run(Command::DeleteBlock(10)), Effect::Release]
        );
        assert_eq!(machine.phase(), &Phase::Idle);
    }

    #[test]
    fn menu_item_runs_its_transform() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 25.0));
        machine.click_handle(&state);
        assert_eq!(
            machine.choose_menu_item(&state, MenuItem::Heading(2)),
            [Effect::Run(Command::heading(2)), Effect::Release]
        );
    }

    #[test]
    fn copy_block_puts_the_block_on_the_clipboard() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 25.0));
        machine.click_handle(&state);
        let effects = machine.choose_menu_item(&state, MenuItem::CopyBlock);
        let [Effect::Copy(data), Effect::Release] = effects.as_slice() else {
            panic!("unexpected effects {effects:?}");
        };
        assert_eq!(data.plain, "two");
    }

    #[test]
    fn second_click_closes_the_menu() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 5.0));
        machine.click_handle(&state);
        assert_eq!(machine.click_handle(&state), [Effect::Release]);
        assert_eq!(machine.phase(), &Phase::Idle);
    }

    fn dragging(state: &EditorState, point: Point) -> Affordance {
        let mut machine = hovering(state, point);
        machine.pointer_down_handle(state);
        let effects = machine.drag_start(state);
        assert!(matches!(effects.as_slice(), [Effect::Select(_), Effect::Transfer(_)]));
        machine
    }

    #[test]
    fn drop_below_moves_the_block() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        assert_eq!(
            machine.drop(state.doc(), &binding(), Point::new(100.0, 48.0)),
            [Effect::Run(Command::Move { from: 0, to: 5, target: 11 }), Effect::Release]
        );
        assert_eq!(machine.phase(), &Phase::Idle);
    }

    #[test]
    fn drop_into_a_nested_block_stays_among_siblings() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        assert_eq!(
            machine.drop(state.doc(), &binding(), Point::new(100.0, 75.0)),
            [Effect::Run(Command::Move { from: 0, to: 5, target: 21 }), Effect::Release]
        );
    }

    #[test]
    fn drop_on_itself_moves_nothing() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        assert_eq!(machine.drop(state.doc(), &binding(), Point::new(100.0, 3.0)), [Effect::Release]);
    }

    #[test]
    fn drop_after_an_edit_is_cancelled() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        let Some(tr) = crate::editing::compile(&state, &Command::InsertText("x".to_string())) else {
            panic!("insert applies");
        };
        let edited = state.apply(tr);
        assert_eq!(machine.drop(edited.doc(), &binding(), Point::new(100.0, 48.0)), [Effect::Release]);
    }

    #[test]
    fn dragging_near_the_edge_scrolls() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        assert_eq!(machine.drag_over(&binding(), Point::new(100.0, 5.0)), [Effect::Scroll(-10.0)]);
        assert!(machine.drag_over(&binding(), Point::new(100.0, 50.0)).is_empty());
    }

    #[test]
    fn leaving_hides_after_the_grace_period() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 5.0));
        let t0 = Instant::now();
        machine.pointer_leave(t0);
        machine.tick(t0 + Duration::from_millis(100));
        assert_eq!(machine.phase(), &Phase::Hovering { pos: 0 });
        machine.tick(t0 + Duration::from_millis(300));
        assert_eq!(machine.phase(), &Phase::Idle);
    }

    #[test]
    fn drag_abandoned_outside_returns_to_idle() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        let t0 = Instant::now();
        machine.pointer_leave(t0);
        assert!(machine.tick(t0 + Duration::from_millis(299)).is_empty());
        assert!(matches!(machine.phase(), Phase::Dragging(_)));
        assert_eq!(machine.tick(t0 + Duration::from_secs(5)), [Effect::Release]);
        assert_eq!(machine.phase(), &Phase::Idle);
        assert!(machine.drop(state.doc(), &binding(), Point::new(100.0, 90.0)).is_empty());
    }

    #[test]
    fn drag_that_comes_back_is_kept() {
        let state = state();
        let mut machine = dragging(&state, Point::new(10.0, 5.0));
        let t0 = Instant::now();
        machine.pointer_leave(t0);
        machine.pointer_enter(t0 + Duration::from_millis(100));
        assert!(machine.tick(t0 + Duration::from_secs(1)).is_empty());
        assert!(matches!(machine.phase(), Phase::Dragging(_)));
    }

    #[test]
    fn reentering_keeps_the_handle() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 5.0));
        let t0 = Instant::now();
        machine.pointer_leave(t0);
        machine.pointer_enter(t0 + Duration::from_millis(100));
        machine.tick(t0 + Duration::from_secs(1));
        assert_eq!(machine.phase(), &Phase::Hovering { pos: 0 });
    }

    #[test]
    fn plus_button_inserts_after_the_hovered_block() {
        let state = state();
        let mut machine = hovering(&state, Point::new(10.0, 25.0));
        assert_eq!(machine.plus_button(), [Effect::Run(Command::InsertParagraphAfter(5))]);
        assert!(Affordance::default().plus_button().is_empty());
    }
}
