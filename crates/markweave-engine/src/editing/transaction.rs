use crate::models::{Attrs, Document, Element, Fragment, Node, Slice};

use super::selection::Selection;
use super::step::{Mapping, Step, StepError};

/// Steps applied so far, the document they produced and the selection
/// mapped through them.
///
/// A failing step leaves the transaction as it was before the call.
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Document,
    doc: Element,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Selection,
}

impl Transaction {
    pub fn new(doc: &Document, selection: Selection) -> Self {
        Self {
            before: doc.clone(),
            doc: doc.root().clone(),
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection,
        }
    }

    pub fn before(&self) -> &Document {
        &self.before
    }

    /// The document after every step so far.
    pub fn doc(&self) -> &Element {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn doc_changed(&self) -> bool {
        self.steps.iter().any(Step::changes_doc)
    }

    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let doc = step.apply(&self.doc)?;
        let map = step.get_map();
        self.selection = match &step {
            Step::SetSelection(selection) => selection.validate(&doc),
            _ => self.selection.map(&doc, &map),
        };
        self.mapping.push(map);
        self.doc = doc;
        self.steps.push(step);
        Ok(self)
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self, StepError> {
        self.step(Step::Replace { from, to, slice })
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::empty())
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> Result<&mut Self, StepError> {
        self.replace(pos, pos, Slice::closed(content))
    }

    /// Replace `[from, to)` with one closed node.
    pub fn replace_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::closed(Fragment::from_node(node)))
    }

    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, StepError> {
        self.step(Step::SetAttrs { pos, attrs })
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        let selection = selection.validate(&self.doc);
        self.selection = selection;
        self.mapping.push(Step::SetSelection(selection).get_map());
        self.steps.push(Step::SetSelection(selection));
        self
    }

    pub(crate) fn into_parts(self) -> (Element, Selection) {
        (self.doc, self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn steps_chain_and_carry_the_selection() {
        let b = builder();
        let doc = Document::new(b.doc(vec![b.p(vec![b.text("hello")])]));
        let mut tr = Transaction::new(&doc, Selection::cursor(6));
        tr.insert(1, Fragment::from_node(b.text(">> "))).unwrap();
        tr.delete(4, 6).unwrap();
        assert_eq!(tr.doc().text_content(), ">> llo");
        assert_eq!(tr.selection(), Selection::cursor(7));
        assert!(tr.doc_changed());
        assert_eq!(tr.steps().len(), 2);
    }

    #[test]
    fn failed_step_leaves_transaction_untouched() {
        let b = builder();
        let doc = Document::new(b.doc(vec![b.p(vec![b.text("ab")])]));
        let mut tr = Transaction::new(&doc, Selection::cursor(1));
        assert!(tr.insert(1, Fragment::from_node(b.hr())).is_err());
        assert!(tr.steps().is_empty());
        assert_eq!(tr.doc(), doc.root());
    }

    #[test]
    fn selection_only_transaction_does_not_change_doc() {
        let b = builder();
        let doc = Document::new(b.doc(vec![b.p(vec![b.text("ab")])]));
        let mut tr = Transaction::new(&doc, Selection::cursor(1));
        tr.set_selection(Selection::text(1, 3));
        assert!(!tr.doc_changed());
        assert_eq!(tr.selection(), Selection::text(1, 3));
    }
}
