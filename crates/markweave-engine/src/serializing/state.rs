//! Document to markdown tree.
//!
//! The mirror of the parser state: kinds write markdown nodes through
//! [`SerializerState`], which keeps marks open across adjacent text runs that
//! share them.
//!
//! ```text
//! runs:   "a"[bold]  "b"[bold, italic]  "c"[]
//! tree:   strong("a", emphasis("b"))  "c"
//! ```

use tracing::debug;

use crate::models::{Element, Mark, Node};
use crate::parsing::ast::{MdKind, MdNode};
use crate::registry::Registry;

struct OpenMark {
    mark: Mark,
    /// `None` for marks with no markdown form; their text is written bare.
    node: Option<MdNode>,
}

pub struct SerializerState<'r> {
    registry: &'r Registry,
    root: MdNode,
    stack: Vec<MdNode>,
    marks: Vec<OpenMark>,
}

impl<'r> SerializerState<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            root: MdNode::leaf(MdKind::Root),
            stack: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Start a markdown node; following output goes inside it.
    pub fn open(&mut self, kind: MdKind) {
        self.close_marks(0);
        self.stack.push(MdNode::leaf(kind));
    }

    pub fn close(&mut self) {
        self.close_marks(0);
        match self.stack.pop() {
            Some(node) => self.target().children.push(node),
            None => debug!("close without an open markdown node"),
        }
    }

    /// Add a finished markdown node. Open marks end here.
    pub fn add(&mut self, node: MdNode) {
        self.close_marks(0);
        self.target().children.push(node);
    }

    /// Write text with its marks, reusing marks still open from the
    /// previous run.
    pub fn text(&mut self, text: &str, marks: &[Mark]) {
        let shared = self
            .marks
            .iter()
            .zip(marks)
            .take_while(|(open, mark)| open.mark == **mark)
            .count();
        self.close_marks(shared);
        for mark in &marks[shared..] {
            self.open_mark(mark);
        }
        self.target().children.push(MdNode::text(text));
    }

    /// Write an element's children: text and inline nodes for textblocks,
    /// blocks otherwise.
    pub fn children(&mut self, el: &Element) {
        for child in el.content() {
            self.node(child);
        }
        self.close_marks(0);
    }

    pub fn node(&mut self, node: &Node) {
        match node {
            Node::Text(run) => self.text(run.text(), run.marks()),
            Node::Element(el) => {
                self.close_marks(0);
                self.element(el);
            }
        }
    }

    pub fn element(&mut self, el: &Element) {
        let registry = self.registry;
        match registry.serializer(el.kind_name()) {
            Some(serializer) => serializer.node(self, el),
            None => {
                debug!(kind = el.kind_name(), "no serializer, writing children only");
                self.children(el);
            }
        }
    }

    /// Close everything and return the markdown root.
    pub fn finish(mut self) -> MdNode {
        self.close_marks(0);
        while let Some(node) = self.stack.pop() {
            self.target().children.push(node);
        }
        self.root
    }

    fn open_mark(&mut self, mark: &Mark) {
        let node = self
            .registry
            .serializer(mark.kind_name())
            .and_then(|serializer| serializer.mark(mark));
        if node.is_none() {
            debug!(mark = mark.kind_name(), "mark has no markdown form, writing text bare");
        }
        self.marks.push(OpenMark {
            mark: mark.clone(),
            node,
        });
    }

    fn close_marks(&mut self, keep: usize) {
        while self.marks.len() > keep {
            let Some(open) = self.marks.pop() else {
                break;
            };
            if let Some(node) = open.node {
                self.target().children.push(node);
            }
        }
    }

    /// Innermost node taking output: the last open mark with a markdown
    /// node, else the last open block.
    fn target(&mut self) -> &mut MdNode {
        if let Some(node) = self.marks.iter_mut().rev().find_map(|m| m.node.as_mut()) {
            return node;
        }
        match self.stack.last_mut() {
            Some(node) => node,
            None => &mut self.root,
        }
    }
}
