//! `doc`, `paragraph` and `text`: present in every registry.

use tracing::warn;

use crate::models::{ContentExpr, Group, NodeSpec, NodeType, Role};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::state::ParserState;
use crate::registry::descriptor::{Kind, KindDescriptor, MarkdownParse};
use crate::registry::{Extension, Options};

use super::{BlockWriter, NodeRule, Transparent};

pub struct DocumentExt;
pub struct ParagraphExt;
pub struct TextExt;

impl Extension for DocumentExt {
    fn name(&self) -> &'static str {
        "doc"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![doc()]
    }
}

impl Extension for ParagraphExt {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![paragraph()]
    }
}

impl Extension for TextExt {
    fn name(&self) -> &'static str {
        "text"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![text()]
    }
}

/// The root walks into the tree; the state already holds the doc frame.
struct RootRule;

impl MarkdownParse for RootRule {
    fn matches(&self, node: &MdNode) -> bool {
        node.kind == MdKind::Root
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, _: &Kind) {
        state.next(&node.children);
    }
}

struct TextRule;

impl MarkdownParse for TextRule {
    fn matches(&self, node: &MdNode) -> bool {
        matches!(node.kind, MdKind::Text(_) | MdKind::Escaped(_))
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, _: &Kind) {
        if let Some(value) = node.value() {
            state.add_text(value);
        }
    }
}

fn doc() -> KindDescriptor {
    KindDescriptor::node("doc", Group::Block)
        .content("block+")
        .parser(RootRule)
        .serializer(Transparent)
}

fn paragraph() -> KindDescriptor {
    KindDescriptor::node("paragraph", Group::Block)
        .content("inline*")
        .parser(NodeRule::new(|n| n.kind == MdKind::Paragraph))
        .serializer(BlockWriter(|_| MdKind::Paragraph))
}

fn text() -> KindDescriptor {
    KindDescriptor::node("text", Group::Inline).parser(TextRule)
}

/// Descriptors of the core kinds, in core order.
pub fn descriptors() -> Vec<KindDescriptor> {
    vec![doc(), paragraph(), text()]
}

/// A bare node type for a core kind the registry somehow lacks. Keeps the
/// registry usable; documents built on it are never valid markdown output.
pub fn fallback_type(name: &str) -> NodeType {
    warn!(kind = name, "core kind missing from registry, using fallback");
    let content = if name == "doc" { "block+" } else { "inline*" };
    NodeType::new(NodeSpec {
        name: name.to_string(),
        group: Group::Block,
        content: ContentExpr::parse(content).unwrap_or_default(),
        attrs: Vec::new(),
        atom: false,
        allows_marks: true,
        code: false,
        role: Role::Plain,
        inline_content: name != "doc",
        leaf_text: None,
    })
}
