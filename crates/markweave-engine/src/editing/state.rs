use std::sync::Arc;

use crate::models::Document;
use crate::registry::Registry;

use super::selection::Selection;
use super::transaction::Transaction;

/// The current document and selection. Applying a transaction is the only
/// transition.
#[derive(Clone)]
pub struct EditorState {
    registry: Arc<Registry>,
    doc: Document,
    selection: Selection,
}

impl EditorState {
    /// Starts with the cursor at the first text position.
    pub fn new(registry: Arc<Registry>, doc: Document) -> Self {
        let selection = Selection::at_start(doc.root());
        Self {
            registry,
            doc,
            selection,
        }
    }

    pub fn empty(registry: Arc<Registry>) -> Self {
        let doc = Document::empty(&registry);
        Self::new(registry, doc)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn tr(&self) -> Transaction {
        Transaction::new(&self.doc, self.selection)
    }

    /// A transaction without document steps keeps the current document
    /// pointer.
    pub fn apply(&self, tr: Transaction) -> EditorState {
        let changed = tr.doc_changed();
        let (doc, selection) = tr.into_parts();
        let doc = if changed { Document::new(doc) } else { self.doc.clone() };
        EditorState {
            registry: Arc::clone(&self.registry),
            doc,
            selection,
        }
    }

    /// Replace the selection without a transaction, e.g. on pointer input.
    pub fn with_selection(&self, selection: Selection) -> EditorState {
        EditorState {
            registry: Arc::clone(&self.registry),
            doc: self.doc.clone(),
            selection: selection.validate(self.doc.root()),
        }
    }
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
