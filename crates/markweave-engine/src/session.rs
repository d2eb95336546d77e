//! # Editor Session
//!
//! One open document: its state, its affordance machine and its change
//! notifications. Hosts talk to the engine only through this type.
//!
//! Every committed transaction that changes the document bumps the version
//! and emits one [`DocumentChanged`] carrying the serialized markdown. The
//! session never retries or blocks; saving is the job of whoever consumes
//! the events (see [`crate::persistence`]).

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::affordance::{Affordance, AffordanceConfig, Effect, MenuItem, Point, ViewBinding};
use crate::clipboard::{self, ClipboardData, ClipboardPayload, Pasted};
use crate::editing::{Command, EditorState, Selection, compile};
use crate::models::Document;
use crate::parsing;
use crate::registry::Registry;
use crate::serializing;

/// Emitted once per committed, document-changing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChanged {
    pub doc_id: Uuid,
    pub version: u64,
    pub serialized: String,
}

type Listener = Box<dyn FnMut(&DocumentChanged)>;

pub struct EditorSession {
    id: Uuid,
    state: EditorState,
    affordance: Affordance,
    version: u64,
    events: Vec<DocumentChanged>,
    listeners: Vec<Listener>,
}

impl EditorSession {
    /// A session holding an empty document.
    pub fn new(registry: Arc<Registry>, config: AffordanceConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: EditorState::empty(registry),
            affordance: Affordance::new(config),
            version: 0,
            events: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.state.registry()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Document {
        self.state.doc()
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    /// Replace the document. Loading is not an edit: no event is emitted.
    /// Returns `false` for input the parser refuses.
    pub fn load_markdown(&mut self, markdown: &str) -> bool {
        let Some(doc) = parsing::parse(self.registry(), markdown) else {
            return false;
        };
        self.state = EditorState::new(Arc::clone(self.registry()), doc);
        self.affordance.cancel();
        true
    }

    pub fn markdown(&self) -> String {
        serializing::serialize(self.registry(), self.doc())
    }

    /// Run a command. `false` means it did not apply and nothing changed.
    pub fn execute(&mut self, command: Command) -> bool {
        let Some(tr) = compile(&self.state, &command) else {
            return false;
        };
        let changed = tr.doc_changed();
        self.state = self.state.apply(tr);
        if changed {
            self.emit();
        }
        true
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.state = self.state.with_selection(selection);
    }

    pub fn copy(&self) -> ClipboardData {
        clipboard::to_clipboard(self.registry(), self.doc(), self.selection())
    }

    /// Paste at the selection. Inside code the plain text goes in as typed.
    pub fn paste(&mut self, payload: ClipboardPayload) -> bool {
        if self.in_code() {
            debug!("pasting into code, using plain text");
            return self.execute(Command::InsertText(payload.plain.replace('\0', "")));
        }
        match clipboard::from_clipboard(self.registry(), &payload) {
            Pasted::Slice(slice) => self.execute(Command::ReplaceSelection(slice)),
            Pasted::Text(text) => self.execute(Command::InsertText(text)),
        }
    }

    fn in_code(&self) -> bool {
        self.doc()
            .resolve(self.selection().from())
            .is_ok_and(|rp| rp.parent().ty().is_code())
    }

    /// Subscribe to document changes.
    pub fn on_update(&mut self, listener: impl FnMut(&DocumentChanged) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<DocumentChanged> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self) {
        self.version += 1;
        let event = DocumentChanged {
            doc_id: self.id,
            version: self.version,
            serialized: self.markdown(),
        };
        debug!(version = event.version, "document changed");
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.events.push(event);
    }

    /// Apply the effects that concern the document and hand the rest
    /// (clipboard, drag transfer, scrolling) back to the host.
    fn apply(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut host = Vec::new();
        for effect in effects {
            match effect {
                Effect::Select(selection) => self.set_selection(selection),
                Effect::Run(command) => {
                    self.execute(command);
                }
                Effect::Release => {
                    let released = self.selection().to_text(self.doc());
                    self.set_selection(released);
                }
                Effect::Copy(_) | Effect::Transfer(_) | Effect::Scroll(_) => host.push(effect),
            }
        }
        host
    }

    pub fn pointer_move(&mut self, binding: &ViewBinding, point: Point) -> Option<usize> {
        self.affordance.pointer_move(self.state.doc(), binding, point)
    }

    pub fn pointer_down_handle(&mut self) -> Vec<Effect> {
        let effects = self.affordance.pointer_down_handle(&self.state);
        self.apply(effects)
    }

    pub fn click_handle(&mut self) -> Vec<Effect> {
        let effects = self.affordance.click_handle(&self.state);
        self.apply(effects)
    }

    /// Returns the drag data for the host's transfer object.
    pub fn drag_start(&mut self) -> Vec<Effect> {
        let effects = self.affordance.drag_start(&self.state);
        self.apply(effects)
    }

    pub fn drag_over(&mut self, binding: &ViewBinding, point: Point) -> Vec<Effect> {
        let effects = self.affordance.drag_over(binding, point);
        self.apply(effects)
    }

    pub fn drop(&mut self, binding: &ViewBinding, point: Point) -> Vec<Effect> {
        let effects = self.affordance.drop(self.state.doc(), binding, point);
        self.apply(effects)
    }

    pub fn cancel_drag(&mut self) -> Vec<Effect> {
        let effects = self.affordance.cancel();
        self.apply(effects)
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        self.affordance.pointer_leave(now);
    }

    pub fn pointer_enter(&mut self, now: Instant) {
        self.affordance.pointer_enter(now);
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let effects = self.affordance.tick(now);
        self.apply(effects)
    }

    pub fn close_menu(&mut self) -> Vec<Effect> {
        let effects = self.affordance.close_menu();
        self.apply(effects)
    }

    pub fn choose_menu_item(&mut self, item: MenuItem) -> Vec<Effect> {
        let effects = self.affordance.choose_menu_item(&self.state, item);
        self.apply(effects)
    }

    pub fn plus_button(&mut self) -> Vec<Effect> {
        let effects = self.affordance.plus_button();
        self.apply(effects)
    }

    /// A click in the empty area below the last block.
    pub fn click_below_content(&mut self) -> bool {
        self.execute(Command::EnsureTrailingParagraph)
    }
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("affordance", &self.affordance)
            .finish_non_exhaustive()
    }
}
