//! # Built-in Kinds
//!
//! The starter kit, in registration order. Order matters twice: parse rules
//! are tried first to last, and mark rank (nesting) follows it.
//!
//! Most kinds map one markdown node to one document node and back, so the
//! shared [`NodeRule`], [`MarkRule`], [`BlockWriter`] and [`MarkWriter`]
//! cover them. Kinds with options or custom syntax implement the traits
//! directly.

pub mod blocks;
pub mod core;
pub mod directives;
pub mod lists;
pub mod marks;

use std::sync::Arc;

use serde_json::Value;

use crate::models::{Attrs, Element, Mark};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::state::ParserState;
use crate::serializing::state::SerializerState;

use super::descriptor::{Kind, MarkdownParse, MarkdownSerialize};
use super::Extension;

/// Every built-in extension with default options.
pub fn starter_kit() -> Vec<Arc<dyn Extension>> {
    vec![
        Arc::new(core::DocumentExt),
        Arc::new(core::ParagraphExt),
        Arc::new(core::TextExt),
        Arc::new(blocks::HeadingExt),
        Arc::new(blocks::BlockquoteExt),
        Arc::new(blocks::CodeBlockExt),
        Arc::new(blocks::HorizontalRuleExt),
        Arc::new(blocks::HardBreakExt),
        Arc::new(lists::BulletListExt),
        Arc::new(lists::OrderedListExt),
        Arc::new(lists::ListItemExt),
        Arc::new(lists::TaskListExt),
        Arc::new(directives::MermaidExt),
        Arc::new(directives::AgentExt),
        Arc::new(directives::MetricExt),
        Arc::new(directives::KnowledgeExt),
        Arc::new(marks::BoldExt),
        Arc::new(marks::ItalicExt),
        Arc::new(marks::StrikeExt),
        Arc::new(marks::UnderlineExt),
        Arc::new(marks::LinkExt),
        Arc::new(marks::HighlightExt),
        Arc::new(marks::SubscriptExt),
        Arc::new(marks::SuperscriptExt),
        Arc::new(marks::CodeExt),
    ]
}

fn no_attrs(_: &MdNode) -> Attrs {
    Attrs::new()
}

/// Opens the kind's node, walks the children, closes it.
pub struct NodeRule {
    matches: fn(&MdNode) -> bool,
    attrs: fn(&MdNode) -> Attrs,
}

impl NodeRule {
    pub fn new(matches: fn(&MdNode) -> bool) -> Self {
        Self {
            matches,
            attrs: no_attrs,
        }
    }

    pub fn with_attrs(mut self, attrs: fn(&MdNode) -> Attrs) -> Self {
        self.attrs = attrs;
        self
    }
}

impl MarkdownParse for NodeRule {
    fn matches(&self, node: &MdNode) -> bool {
        (self.matches)(node)
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let Some(ty) = kind.as_node() else {
            return;
        };
        state.open_node(ty, (self.attrs)(node));
        state.next(&node.children);
        state.close_node();
    }
}

/// Opens the kind's mark over the children.
pub struct MarkRule {
    matches: fn(&MdNode) -> bool,
    attrs: fn(&MdNode) -> Attrs,
}

impl MarkRule {
    pub fn new(matches: fn(&MdNode) -> bool) -> Self {
        Self {
            matches,
            attrs: no_attrs,
        }
    }

    pub fn with_attrs(mut self, attrs: fn(&MdNode) -> Attrs) -> Self {
        self.attrs = attrs;
        self
    }
}

impl MarkdownParse for MarkRule {
    fn matches(&self, node: &MdNode) -> bool {
        (self.matches)(node)
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let Some(ty) = kind.as_mark() else {
            return;
        };
        let attrs = ty
            .compute_attrs(Some(&(self.attrs)(node)))
            .or_else(|_| ty.compute_attrs(None))
            .unwrap_or_default();
        state.open_mark(Mark::new(ty.clone(), attrs));
        state.next(&node.children);
        state.close_mark(ty);
    }
}

/// Writes a container markdown node around the element's children.
pub struct BlockWriter(pub fn(&Element) -> MdKind);

impl MarkdownSerialize for BlockWriter {
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        state.open((self.0)(el));
        state.children(el);
        state.close();
    }
}

/// Writes a markdown node with no children in place of the element.
pub struct LeafWriter(pub fn(&Element) -> MdKind);

impl MarkdownSerialize for LeafWriter {
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        state.add(MdNode::leaf((self.0)(el)));
    }
}

/// Wraps marked text in a markdown node.
pub struct MarkWriter(pub fn(&Mark) -> MdKind);

impl MarkdownSerialize for MarkWriter {
    fn mark(&self, mark: &Mark) -> Option<MdNode> {
        Some(MdNode::leaf((self.0)(mark)))
    }
}

/// Serializer for kinds whose markdown is just their children.
pub struct Transparent;

impl MarkdownSerialize for Transparent {}

pub(crate) fn attr_str<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

pub(crate) fn attr_u64(attrs: &Attrs, key: &str) -> Option<u64> {
    attrs.get(key).and_then(Value::as_u64)
}

pub(crate) fn attr_bool(attrs: &Attrs, key: &str) -> bool {
    attrs.get(key).and_then(Value::as_bool).unwrap_or(false)
}
