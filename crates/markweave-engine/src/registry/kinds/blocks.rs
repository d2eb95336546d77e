//! Headings, quotes, code, rules and hard breaks.

use serde_json::{Value, json};

use crate::models::{Attrs, Element, Group, Node};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::blocks::kinds::AtxHeading;
use crate::parsing::state::ParserState;
use crate::registry::descriptor::{Kind, KindDescriptor, MarkdownParse, MarkdownSerialize};
use crate::registry::{Extension, Options};
use crate::serializing::state::SerializerState;

use super::{BlockWriter, LeafWriter, NodeRule, attr_str, attr_u64};

pub struct HeadingExt;
pub struct BlockquoteExt;
pub struct CodeBlockExt;
pub struct HorizontalRuleExt;
pub struct HardBreakExt;

impl Extension for HeadingExt {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn default_options(&self) -> Options {
        let mut options = Options::new();
        options.insert("levels".into(), json!([1, 2, 3, 4, 5, 6]));
        options
    }

    fn descriptors(&self, options: &Options) -> Vec<KindDescriptor> {
        let levels: Vec<u8> = options
            .get("levels")
            .and_then(Value::as_array)
            .map(|levels| {
                levels
                    .iter()
                    .filter_map(Value::as_u64)
                    .filter_map(|l| u8::try_from(l).ok())
                    .filter(|l| (1..=AtxHeading::MAX_LEVEL).contains(l))
                    .collect()
            })
            .unwrap_or_default();
        let default_level = levels.first().copied().unwrap_or(1);
        vec![
            KindDescriptor::node("heading", Group::Block)
                .content("inline*")
                .attr("level", json!(default_level))
                .parser(HeadingRule { levels })
                .serializer(BlockWriter(|el| MdKind::Heading {
                    depth: attr_u64(el.attrs(), "level")
                        .and_then(|l| u8::try_from(l).ok())
                        .unwrap_or(1)
                        .clamp(1, AtxHeading::MAX_LEVEL),
                })),
        ]
    }
}

/// Headings at a level that is not enabled become paragraphs.
struct HeadingRule {
    levels: Vec<u8>,
}

impl MarkdownParse for HeadingRule {
    fn matches(&self, node: &MdNode) -> bool {
        matches!(node.kind, MdKind::Heading { .. })
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let MdKind::Heading { depth } = node.kind else {
            return;
        };
        let Some(heading) = kind.as_node() else {
            return;
        };
        if self.levels.contains(&depth) {
            let attrs = Attrs::from([("level".to_string(), json!(depth))]);
            state.open_node(heading, attrs);
        } else {
            let paragraph = state.registry().paragraph_type().clone();
            state.open_node(&paragraph, Attrs::new());
        }
        state.next(&node.children);
        state.close_node();
    }
}

impl Extension for BlockquoteExt {
    fn name(&self) -> &'static str {
        "blockquote"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("blockquote", Group::Block)
                .content("block+")
                .parser(NodeRule::new(|n| n.kind == MdKind::Blockquote))
                .serializer(BlockWriter(|_| MdKind::Blockquote)),
        ]
    }
}

impl Extension for CodeBlockExt {
    fn name(&self) -> &'static str {
        "codeBlock"
    }

    fn default_options(&self) -> Options {
        let mut options = Options::new();
        options.insert("defaultLanguage".into(), Value::Null);
        options
    }

    fn descriptors(&self, options: &Options) -> Vec<KindDescriptor> {
        let default_language = options
            .get("defaultLanguage")
            .and_then(Value::as_str)
            .map(str::to_string);
        vec![
            KindDescriptor::node("codeBlock", Group::Block)
                .content("text*")
                .code()
                .attr("language", Value::Null)
                .parser(CodeBlockRule { default_language })
                .serializer(CodeBlockWriter),
        ]
    }
}

struct CodeBlockRule {
    default_language: Option<String>,
}

impl MarkdownParse for CodeBlockRule {
    fn matches(&self, node: &MdNode) -> bool {
        matches!(node.kind, MdKind::Code { .. })
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let (MdKind::Code { lang, value }, Some(ty)) = (&node.kind, kind.as_node()) else {
            return;
        };
        let language = lang
            .clone()
            .or_else(|| self.default_language.clone())
            .map_or(Value::Null, Value::String);
        let attrs = Attrs::from([("language".to_string(), language)]);
        let content = if value.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(value.clone(), Vec::new())]
        };
        state.add_node(ty, attrs, content);
    }
}

struct CodeBlockWriter;

impl MarkdownSerialize for CodeBlockWriter {
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        state.add(MdNode::leaf(MdKind::Code {
            lang: attr_str(el.attrs(), "language").map(str::to_string),
            value: el.text_content(),
        }));
    }
}

impl Extension for HorizontalRuleExt {
    fn name(&self) -> &'static str {
        "horizontalRule"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("horizontalRule", Group::Block)
                .atom()
                .parser(LeafRule(|n| n.kind == MdKind::ThematicBreak))
                .serializer(LeafWriter(|_| MdKind::ThematicBreak)),
        ]
    }
}

impl Extension for HardBreakExt {
    fn name(&self) -> &'static str {
        "hardBreak"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("hardBreak", Group::Inline)
                .atom()
                .leaf_text("\n")
                .parser(LeafRule(|n| n.kind == MdKind::Break))
                .serializer(LeafWriter(|_| MdKind::Break)),
        ]
    }
}

/// Adds an attribute-less leaf node.
struct LeafRule(fn(&MdNode) -> bool);

impl MarkdownParse for LeafRule {
    fn matches(&self, node: &MdNode) -> bool {
        (self.0)(node)
    }

    fn apply(&self, state: &mut ParserState<'_>, _: &MdNode, kind: &Kind) {
        if let Some(ty) = kind.as_node() {
            state.add_node(ty, Attrs::new(), Vec::new());
        }
    }
}
