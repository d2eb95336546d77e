//! Terse document builders for unit tests.

use serde_json::{Value, json};

use crate::models::{Attrs, Element, Fragment, Mark, Node};
use crate::registry::Registry;

pub struct Builder {
    pub registry: Registry,
}

pub fn builder() -> Builder {
    Builder {
        registry: Registry::standard(),
    }
}

impl Builder {
    /// Any registered node kind; panics on unknown names or attributes.
    pub fn element(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Element {
        let ty = self
            .registry
            .node_type(name)
            .unwrap_or_else(|| panic!("unknown kind {name}"));
        let attrs = ty.compute_attrs(Some(&attrs)).expect("valid attrs");
        Element::new(ty.clone(), attrs, Fragment::from_vec(content))
    }

    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Node {
        self.element(name, attrs, content).into_node()
    }

    pub fn doc(&self, content: Vec<Node>) -> Element {
        self.element("doc", Attrs::new(), content)
    }

    pub fn p(&self, content: Vec<Node>) -> Node {
        self.node("paragraph", Attrs::new(), content)
    }

    pub fn h(&self, level: u8, content: Vec<Node>) -> Node {
        self.node("heading", attrs(&[("level", json!(level))]), content)
    }

    pub fn bq(&self, content: Vec<Node>) -> Node {
        self.node("blockquote", Attrs::new(), content)
    }

    pub fn ul(&self, items: Vec<Node>) -> Node {
        self.node("bulletList", Attrs::new(), items)
    }

    pub fn ol(&self, start: u64, items: Vec<Node>) -> Node {
        self.node("orderedList", attrs(&[("start", json!(start))]), items)
    }

    pub fn li(&self, content: Vec<Node>) -> Node {
        self.node("listItem", Attrs::new(), content)
    }

    pub fn tasks(&self, items: Vec<Node>) -> Node {
        self.node("taskList", Attrs::new(), items)
    }

    pub fn task(&self, checked: bool, content: Vec<Node>) -> Node {
        self.node("taskItem", attrs(&[("checked", json!(checked))]), content)
    }

    pub fn code_block(&self, content: Vec<Node>) -> Node {
        self.node("codeBlock", Attrs::new(), content)
    }

    pub fn hr(&self) -> Node {
        self.node("horizontalRule", Attrs::new(), Vec::new())
    }

    pub fn br(&self) -> Node {
        self.node("hardBreak", Attrs::new(), Vec::new())
    }

    pub fn mermaid(&self, source: &str) -> Node {
        self.node("mermaid", Attrs::new(), vec![self.text(source)])
    }

    pub fn metric(&self, value: Value) -> Node {
        self.node("metric", attrs(&[("metric", value)]), Vec::new())
    }

    pub fn agent(&self, value: Value) -> Node {
        self.node("agent", attrs(&[("agent", value)]), Vec::new())
    }

    pub fn text(&self, text: &str) -> Node {
        Node::text(text, Vec::new())
    }

    pub fn mark(&self, name: &str) -> Mark {
        self.mark_with(name, Attrs::new())
    }

    pub fn mark_with(&self, name: &str, mark_attrs: Attrs) -> Mark {
        let ty = self
            .registry
            .mark_type(name)
            .unwrap_or_else(|| panic!("unknown mark {name}"));
        let computed = ty.compute_attrs(Some(&mark_attrs)).expect("valid attrs");
        Mark::new(ty.clone(), computed)
    }

    /// Text with default-attribute marks.
    pub fn marked(&self, text: &str, marks: &[&str]) -> Node {
        Node::text(text, marks.iter().map(|m| self.mark(m)).collect())
    }

    pub fn link(&self, text: &str, href: &str) -> Node {
        Node::text(text, vec![self.mark_with("link", attrs(&[("href", json!(href))]))])
    }
}

pub fn attrs(pairs: &[(&str, Value)]) -> Attrs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
