//! Embeds written as directives.
//!
//! ```text
//! :::mermaid            ::agent{agent={"id":"7","name":"Ada"}}
//! graph TD; A-->B       text ::metric{metric={"id":"42"}} text
//! :::
//! ```
//!
//! JSON attributes that fail to parse become `null`; the node is kept.

use markweave_syntax::DirectiveAttr;
use serde_json::Value;
use tracing::debug;

use crate::models::{Attrs, Element, Group, Node};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::processor::Processor;
use crate::parsing::state::ParserState;
use crate::registry::descriptor::{Kind, KindDescriptor, MarkdownParse, MarkdownSerialize, SyntaxHooks};
use crate::registry::{Extension, Options};
use crate::serializing::state::SerializerState;

pub struct MermaidExt;
pub struct AgentExt;
pub struct MetricExt;
pub struct KnowledgeExt;

const MERMAID: &str = "mermaid";

impl Extension for MermaidExt {
    fn name(&self) -> &'static str {
        MERMAID
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node(MERMAID, Group::Block)
                .content("text*")
                .atom()
                .no_marks()
                .parser(MermaidRule)
                .serializer(MermaidWriter)
                .hooks(MermaidSyntax),
        ]
    }
}

/// The diagram source is not markdown.
struct MermaidSyntax;

impl SyntaxHooks for MermaidSyntax {
    fn after_init(&self, processor: &mut Processor) {
        processor.raw_container(MERMAID);
    }
}

struct MermaidRule;

impl MarkdownParse for MermaidRule {
    fn matches(&self, node: &MdNode) -> bool {
        matches!(&node.kind, MdKind::ContainerDirective { name, .. } if name == MERMAID)
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let (MdKind::ContainerDirective { raw, .. }, Some(ty)) = (&node.kind, kind.as_node()) else {
            return;
        };
        let content = if raw.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(raw.clone(), Vec::new())]
        };
        state.add_node(ty, Attrs::new(), content);
    }
}

struct MermaidWriter;

impl MarkdownSerialize for MermaidWriter {
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        state.add(MdNode::leaf(MdKind::ContainerDirective {
            name: MERMAID.to_string(),
            attributes: Vec::new(),
            raw: el.text_content(),
        }));
    }
}

impl Extension for AgentExt {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("agent", Group::Block)
                .atom()
                .attr("agent", Value::Null)
                .parser(EmbedRule::leaf("agent"))
                .serializer(EmbedWriter::leaf("agent")),
        ]
    }
}

impl Extension for MetricExt {
    fn name(&self) -> &'static str {
        "metric"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("metric", Group::Inline)
                .atom()
                .attr("metric", Value::Null)
                .parser(EmbedRule::inline("metric"))
                .serializer(EmbedWriter::inline("metric")),
        ]
    }
}

impl Extension for KnowledgeExt {
    fn name(&self) -> &'static str {
        "knowledge"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("knowledge", Group::Inline)
                .atom()
                .attr("knowledge", Value::Null)
                .parser(EmbedRule::inline("knowledge"))
                .serializer(EmbedWriter::inline("knowledge")),
        ]
    }
}

/// A directive named like the kind, with one JSON attribute of the same
/// name. Inline embeds also accept the leaf form; the state wraps them in a
/// paragraph.
struct EmbedRule {
    name: &'static str,
    inline: bool,
}

impl EmbedRule {
    fn leaf(name: &'static str) -> Self {
        Self { name, inline: false }
    }

    fn inline(name: &'static str) -> Self {
        Self { name, inline: true }
    }
}

impl MarkdownParse for EmbedRule {
    fn matches(&self, node: &MdNode) -> bool {
        match &node.kind {
            MdKind::LeafDirective { name, .. } => name == self.name,
            MdKind::TextDirective { name, .. } => self.inline && name == self.name,
            _ => false,
        }
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let Some(ty) = kind.as_node() else {
            return;
        };
        let value = node.directive_attr(self.name).map_or(Value::Null, |raw| {
            serde_json::from_str(raw).unwrap_or_else(|error| {
                debug!(kind = self.name, %error, "directive attribute is not JSON");
                Value::Null
            })
        });
        let attrs = Attrs::from([(self.name.to_string(), value)]);
        state.add_node(ty, attrs, Vec::new());
    }
}

struct EmbedWriter {
    name: &'static str,
    inline: bool,
}

impl EmbedWriter {
    fn leaf(name: &'static str) -> Self {
        Self { name, inline: false }
    }

    fn inline(name: &'static str) -> Self {
        Self { name, inline: true }
    }
}

impl MarkdownSerialize for EmbedWriter {
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        let attributes: Vec<DirectiveAttr> = el
            .attr(self.name)
            .filter(|v| !v.is_null())
            .map(|v| DirectiveAttr::new(self.name, v.to_string()))
            .into_iter()
            .collect();
        let name = self.name.to_string();
        let kind = if self.inline {
            MdKind::TextDirective { name, attributes }
        } else {
            MdKind::LeafDirective { name, attributes }
        };
        state.add(MdNode::leaf(kind));
    }
}
