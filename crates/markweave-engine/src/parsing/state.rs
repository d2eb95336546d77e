//! Tree-building state for the markdown parser.
//!
//! Rules drive a stack of open nodes. The state keeps the result valid as it
//! goes: inline content at block level is wrapped in an implicit paragraph,
//! children a parent does not accept are dropped, and required children that
//! are missing are filled in when a node closes.

use std::sync::Arc;

use tracing::debug;

use crate::models::{Attrs, Document, Element, Fragment, Mark, MarkType, Node, NodeType, TextRun};
use crate::registry::Registry;

use super::ast::MdNode;

struct Frame {
    ty: NodeType,
    attrs: Attrs,
    content: Vec<Node>,
    /// Opened by the state itself (a paragraph around stray inline content)
    /// rather than by a rule.
    implicit: bool,
    /// Reopened after a block split this textblock; dropped if nothing
    /// follows.
    continued: bool,
}

impl Frame {
    fn new(ty: NodeType, attrs: Attrs, implicit: bool) -> Self {
        Self {
            ty,
            attrs,
            content: Vec::new(),
            implicit,
            continued: false,
        }
    }
}

pub struct ParserState<'r> {
    registry: &'r Registry,
    stack: Vec<Frame>,
    marks: Vec<Mark>,
}

impl<'r> ParserState<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            stack: vec![Frame::new(registry.doc_type().clone(), Attrs::new(), false)],
            marks: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Walk markdown nodes, applying the first rule that matches each.
    pub fn next(&mut self, nodes: &[MdNode]) {
        let registry = self.registry;
        for node in nodes {
            match registry.rules().find(|rule| rule.parser.matches(node)) {
                Some(rule) => rule.parser.apply(self, node, rule.kind),
                None => debug!(node = node.type_name(), "no rule for markdown node, dropping it"),
            }
        }
    }

    pub fn open_node(&mut self, ty: &NodeType, attrs: Attrs) {
        if ty.is_block() {
            self.close_implicit();
        } else {
            self.ensure_inline_parent();
        }
        let attrs = node_attrs(ty, attrs);
        self.stack.push(Frame::new(ty.clone(), attrs, false));
    }

    /// Close the node opened last by a rule.
    pub fn close_node(&mut self) {
        self.close_implicit();
        if self.stack.len() <= 1 {
            debug!("close_node without an open node");
            return;
        }
        self.pop_frame();
    }

    /// Add a complete node with the given children.
    pub fn add_node(&mut self, ty: &NodeType, attrs: Attrs, content: Vec<Node>) {
        if ty.is_block() {
            self.close_implicit();
        } else {
            self.ensure_inline_parent();
        }
        let frame = Frame {
            ty: ty.clone(),
            attrs: node_attrs(ty, attrs),
            content,
            implicit: false,
            continued: false,
        };
        if let Some(node) = self.finish_frame(frame) {
            self.add_to_parent(node);
        }
    }

    /// Add text carrying the currently open marks.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ensure_inline_parent();
        let marks = self.marks.clone();
        if let Some(top) = self.stack.last_mut() {
            top.content.push(Node::Text(TextRun::new(text, marks)));
        }
    }

    pub fn open_mark(&mut self, mark: Mark) {
        let mut marks = std::mem::take(&mut self.marks);
        marks.retain(|m| m.ty() != mark.ty());
        marks.push(mark);
        self.marks = Mark::normalize(marks);
    }

    pub fn close_mark(&mut self, ty: &MarkType) {
        if let Some(i) = self.marks.iter().rposition(|m| m.ty() == ty) {
            self.marks.remove(i);
        }
    }

    /// Close everything and return the document root.
    pub fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.pop_frame();
        }
        let root = match self.stack.pop() {
            Some(frame) => self.finish_frame(frame),
            None => None,
        };
        match root {
            Some(Node::Element(el)) => Arc::unwrap_or_clone(el),
            _ => Document::empty(self.registry).root().clone(),
        }
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.continued && frame.content.is_empty() {
            return;
        }
        if let Some(node) = self.finish_frame(frame) {
            self.add_to_parent(node);
        }
    }

    fn close_implicit(&mut self) {
        while self.stack.len() > 1 && self.stack.last().is_some_and(|f| f.implicit) {
            self.pop_frame();
        }
    }

    fn ensure_inline_parent(&mut self) {
        let needs_paragraph = self
            .stack
            .last()
            .is_some_and(|f| !f.ty.spec().inline_content);
        if needs_paragraph {
            let paragraph = self.registry.paragraph_type().clone();
            self.stack.push(Frame::new(paragraph, Attrs::new(), true));
        }
    }

    /// Append to the innermost open node. A block arriving inside a textblock
    /// splits it: the part so far is closed, the block follows it, and an
    /// empty continuation of the textblock is reopened.
    fn add_to_parent(&mut self, node: Node) {
        let split = node.is_block()
            && self.stack.len() > 1
            && self.stack.last().is_some_and(|f| f.ty.is_textblock());
        if !split {
            if let Some(top) = self.stack.last_mut() {
                top.content.push(node);
            }
            return;
        }
        let Some(textblock) = self.stack.pop() else {
            return;
        };
        let mut rest = Frame::new(textblock.ty.clone(), textblock.attrs.clone(), textblock.implicit);
        rest.continued = true;
        if !textblock.content.is_empty()
            && let Some(done) = self.finish_frame(textblock)
        {
            self.add_to_parent(done);
        }
        self.add_to_parent(node);
        self.stack.push(rest);
    }

    /// Validate a frame into a node: drop children the kind does not accept,
    /// strip marks where they are not allowed, fill missing required
    /// children.
    fn finish_frame(&self, frame: Frame) -> Option<Node> {
        let Frame { ty, attrs, content, .. } = frame;
        let expr = ty.content();
        let mut kept: Vec<Node> = Vec::with_capacity(content.len());
        for child in content {
            if !expr.accepts(&child) {
                debug!(parent = ty.name(), child = child.kind_name(), "dropping child the parent does not accept");
                continue;
            }
            match child {
                Node::Text(run) if !ty.allows_marks() && !run.marks().is_empty() => {
                    kept.push(Node::Text(run.with_marks(Vec::new())));
                }
                child => kept.push(child),
            }
        }
        let mut items = Fragment::from_vec(kept).into_vec();
        loop {
            if let Some(el) = self.registry.fill(&ty, attrs.clone(), items.clone()) {
                return Some(el.into_node());
            }
            let Some(dropped) = items.pop() else {
                debug!(kind = ty.name(), "cannot build a valid node, dropping it");
                return None;
            };
            debug!(parent = ty.name(), child = dropped.kind_name(), "dropping child that breaks the content expression");
        }
    }
}

/// Attribute defaults merged with the given values; unknown names are
/// dropped.
fn node_attrs(ty: &NodeType, attrs: Attrs) -> Attrs {
    match ty.compute_attrs(Some(&attrs)) {
        Ok(attrs) => attrs,
        Err(error) => {
            debug!(kind = ty.name(), %error, "ignoring unknown attributes");
            let known: Attrs = match ty.compute_attrs(None) {
                Ok(defaults) => attrs
                    .into_iter()
                    .filter(|(k, _)| defaults.contains_key(k))
                    .collect(),
                Err(_) => Attrs::new(),
            };
            ty.compute_attrs(Some(&known)).unwrap_or_default()
        }
    }
}
