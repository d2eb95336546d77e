//! External HTML to the markdown tree.
//!
//! The lexer gives a flat event stream; a tolerant tree is rebuilt from it
//! (unclosed elements close with their parent, stray end tags are ignored)
//! and mapped onto [`MdNode`]s so the registry's parse rules do the rest.
//! Elements without a mapping are unwrapped.

use markweave_syntax::DirectiveAttr;
use markweave_syntax::html::{HtmlEvent, Tag, events};
use tracing::debug;

use crate::parsing::ast::{MdKind, MdNode};
use crate::registry::kinds::marks::flags_for_colour;

#[derive(Debug)]
enum HtmlNode {
    Element(Tag, Vec<HtmlNode>),
    Text(String),
}

/// Elements whose content never reaches the document.
const DISCARDED: [&str; 4] = ["script", "style", "head", "title"];

/// Kinds carried by `data-type` on embed elements.
const EMBEDS: [&str; 4] = ["metric", "knowledge", "agent", "mermaid"];

fn tree(html: &str) -> Vec<HtmlNode> {
    let mut stack: Vec<(Tag, Vec<HtmlNode>)> = Vec::new();
    let mut root = Vec::new();
    let mut skipping: Option<String> = None;

    for event in events(html) {
        if let Some(name) = &skipping {
            if matches!(&event, HtmlEvent::End(end) if end == name) {
                skipping = None;
            }
            continue;
        }
        match event {
            HtmlEvent::Start(tag) if DISCARDED.contains(&tag.name.as_str()) => {
                if !tag.self_closing {
                    skipping = Some(tag.name);
                }
            }
            HtmlEvent::Start(tag) if tag.is_void() || tag.self_closing => {
                push(&mut stack, &mut root, HtmlNode::Element(tag, Vec::new()));
            }
            HtmlEvent::Start(tag) => stack.push((tag, Vec::new())),
            HtmlEvent::End(name) => {
                let Some(open) = stack.iter().rposition(|(tag, _)| tag.name == name) else {
                    continue;
                };
                while stack.len() > open {
                    if let Some((tag, children)) = stack.pop() {
                        push(&mut stack, &mut root, HtmlNode::Element(tag, children));
                    }
                }
            }
            HtmlEvent::Text(text) => {
                let decoded = html_escape::decode_html_entities(text).into_owned();
                push(&mut stack, &mut root, HtmlNode::Text(decoded));
            }
        }
    }
    while let Some((tag, children)) = stack.pop() {
        push(&mut stack, &mut root, HtmlNode::Element(tag, children));
    }
    root
}

fn push(stack: &mut [(Tag, Vec<HtmlNode>)], root: &mut Vec<HtmlNode>, node: HtmlNode) {
    match stack.last_mut() {
        Some((_, children)) => children.push(node),
        None => root.push(node),
    }
}

/// Map an HTML fragment onto a markdown root.
pub fn to_markdown_tree(html: &str) -> MdNode {
    MdNode::new(MdKind::Root, blocks(&tree(html)))
}

/// Block-level conversion. Inline runs between blocks become paragraphs.
fn blocks(nodes: &[HtmlNode]) -> Vec<MdNode> {
    let mut out = Vec::new();
    let mut run: Vec<MdNode> = Vec::new();
    for node in nodes {
        match block(node) {
            Some(converted) => {
                flush_paragraph(&mut run, &mut out);
                out.extend(converted);
            }
            None => run.extend(inline(node)),
        }
    }
    flush_paragraph(&mut run, &mut out);
    out
}

fn flush_paragraph(run: &mut Vec<MdNode>, out: &mut Vec<MdNode>) {
    let children = trim_inline(std::mem::take(run));
    if !children.is_empty() {
        out.push(MdNode::new(MdKind::Paragraph, children));
    }
}

/// The blocks an element converts to, or `None` for inline content.
fn block(node: &HtmlNode) -> Option<Vec<MdNode>> {
    let HtmlNode::Element(tag, children) = node else {
        return None;
    };
    if let Some(embed) = embed(tag, children) {
        return embed.kind.is_block().then(|| vec![embed.node]);
    }
    let converted = match tag.name.as_str() {
        "p" => MdNode::new(MdKind::Paragraph, trim_inline(inlines(children))),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let depth = tag.name[1..].parse().unwrap_or(1);
            MdNode::new(MdKind::Heading { depth }, trim_inline(inlines(children)))
        }
        "blockquote" => MdNode::new(MdKind::Blockquote, blocks(children)),
        "hr" => MdNode::leaf(MdKind::ThematicBreak),
        "pre" => MdNode::leaf(MdKind::Code {
            lang: code_language(children),
            value: text_of(children).trim_end_matches('\n').to_string(),
        }),
        "ul" | "ol" => list(tag, children),
        "li" => list_item(tag, children),
        "div" | "section" | "article" | "main" | "header" | "footer" | "body" | "html" | "table" | "tbody"
        | "thead" | "tr" | "td" | "th" | "figure" => return Some(blocks(children)),
        _ if children.iter().any(|child| block(child).is_some()) => return Some(blocks(children)),
        _ => return None,
    };
    Some(vec![converted])
}

fn list(tag: &Tag, children: &[HtmlNode]) -> MdNode {
    let ordered = tag.name == "ol";
    let start = tag.attr("start").and_then(|s| s.parse().ok()).unwrap_or(1);
    let items = children
        .iter()
        .filter_map(|child| match child {
            HtmlNode::Element(item, content) if item.name == "li" => Some(list_item(item, content)),
            HtmlNode::Text(text) if text.trim().is_empty() => None,
            other => Some(MdNode::new(MdKind::ListItem { checked: None }, blocks(std::slice::from_ref(other)))),
        })
        .collect();
    MdNode::new(MdKind::List { ordered, start }, items)
}

fn list_item(tag: &Tag, children: &[HtmlNode]) -> MdNode {
    let checked = task_state(tag, children);
    let content = blocks(&without_checkboxes(children));
    MdNode::new(MdKind::ListItem { checked }, content)
}

/// A list item is a task when it carries a checkbox, directly or inside its
/// first paragraph, or marks itself as one.
fn task_state(tag: &Tag, children: &[HtmlNode]) -> Option<bool> {
    if tag.attr("data-type") == Some("taskItem") || tag.has_attr("data-checked") {
        return Some(tag.attr("data-checked") == Some("true"));
    }
    find_checkbox(children).map(|checkbox| checkbox.has_attr("checked"))
}

fn find_checkbox(nodes: &[HtmlNode]) -> Option<&Tag> {
    nodes.iter().find_map(|node| match node {
        HtmlNode::Element(tag, _) if is_checkbox(tag) => Some(tag),
        HtmlNode::Element(tag, children) if matches!(tag.name.as_str(), "p" | "label" | "div" | "span") => {
            find_checkbox(children)
        }
        _ => None,
    })
}

fn is_checkbox(tag: &Tag) -> bool {
    tag.name == "input" && tag.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

fn without_checkboxes(nodes: &[HtmlNode]) -> Vec<HtmlNode> {
    nodes
        .iter()
        .filter_map(|node| match node {
            HtmlNode::Element(tag, _) if is_checkbox(tag) => None,
            HtmlNode::Element(tag, children) => {
                Some(HtmlNode::Element(tag.clone(), without_checkboxes(children)))
            }
            HtmlNode::Text(text) => Some(HtmlNode::Text(text.clone())),
        })
        .collect()
}

fn code_language(children: &[HtmlNode]) -> Option<String> {
    children.iter().find_map(|child| match child {
        HtmlNode::Element(tag, _) if tag.name == "code" => tag
            .attr("class")?
            .split_whitespace()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string),
        _ => None,
    })
}

fn inlines(nodes: &[HtmlNode]) -> Vec<MdNode> {
    nodes.iter().flat_map(inline).collect()
}

fn inline(node: &HtmlNode) -> Vec<MdNode> {
    let (tag, children) = match node {
        HtmlNode::Text(text) => return collapse_whitespace(text).map(MdNode::text).into_iter().collect(),
        HtmlNode::Element(tag, children) => (tag, children),
    };
    if let Some(embed) = embed(tag, children) {
        if embed.kind.is_block() {
            debug!(kind = embed.kind.name(), "block embed inside inline html, dropping it");
            return Vec::new();
        }
        return vec![embed.node];
    }
    let kind = match tag.name.as_str() {
        "br" => return vec![MdNode::leaf(MdKind::Break)],
        "strong" => MdKind::Strong,
        // Google Docs wraps whole documents in a non-bold <b>
        "b" if !is_normal_weight(tag) => MdKind::Strong,
        "em" | "i" => MdKind::Emphasis,
        "s" | "del" | "strike" => MdKind::Delete,
        "code" | "kbd" | "samp" => return vec![MdNode::new(MdKind::InlineCode, vec![MdNode::text(text_of(children))])],
        "a" => match tag.attr("href") {
            Some(href) => MdKind::Link {
                url: href.to_string(),
                title: tag.attr("title").map(str::to_string),
            },
            None => return inlines(children),
        },
        "u" | "ins" => decoration("underline", String::new()),
        "mark" => decoration("highlight", tag.attr("data-color").map(flags_for_colour).unwrap_or_default()),
        "sub" => decoration("subscript", String::new()),
        "sup" => decoration("superscript", String::new()),
        "img" => return tag.attr("alt").map(MdNode::text).into_iter().collect(),
        _ => return inlines(children),
    };
    vec![MdNode::new(kind, inlines(children))]
}

fn is_normal_weight(tag: &Tag) -> bool {
    tag.attr("style")
        .is_some_and(|style| style.replace(' ', "").contains("font-weight:normal"))
}

fn decoration(name: &str, flags: String) -> MdKind {
    MdKind::Decoration {
        name: name.to_string(),
        flags,
    }
}

enum EmbedKind {
    Inline(&'static str),
    Block(&'static str),
}

impl EmbedKind {
    fn is_block(&self) -> bool {
        matches!(self, EmbedKind::Block(_))
    }

    fn name(&self) -> &'static str {
        match self {
            EmbedKind::Inline(name) | EmbedKind::Block(name) => *name,
        }
    }
}

struct Embed {
    kind: EmbedKind,
    node: MdNode,
}

/// `data-type="metric"` and friends, as the editor renders its embeds.
/// The attribute value travels in `data-<kind>` as JSON.
fn embed(tag: &Tag, children: &[HtmlNode]) -> Option<Embed> {
    let data_type = tag.attr("data-type")?;
    let name = EMBEDS.iter().copied().find(|name| *name == data_type)?;
    let attributes: Vec<DirectiveAttr> = tag
        .attr(&format!("data-{name}"))
        .map(|value| DirectiveAttr::new(name, value))
        .into_iter()
        .collect();
    let (kind, node) = match name {
        "mermaid" => (
            EmbedKind::Block(name),
            MdNode::leaf(MdKind::ContainerDirective {
                name: name.to_string(),
                attributes: Vec::new(),
                raw: text_of(children).trim_end_matches('\n').to_string(),
            }),
        ),
        "agent" => (
            EmbedKind::Block(name),
            MdNode::leaf(MdKind::LeafDirective {
                name: name.to_string(),
                attributes,
            }),
        ),
        _ => (
            EmbedKind::Inline(name),
            MdNode::leaf(MdKind::TextDirective {
                name: name.to_string(),
                attributes,
            }),
        ),
    };
    Some(Embed { kind, node })
}

fn text_of(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(tag, _) if tag.name == "br" => out.push('\n'),
            HtmlNode::Element(_, children) => out.push_str(&text_of(children)),
        }
    }
    out
}

/// HTML whitespace rules: any run collapses to one space. Pure formatting
/// whitespace (containing a newline) between tags disappears.
fn collapse_whitespace(text: &str) -> Option<String> {
    if text.trim().is_empty() && text.contains('\n') {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Leading and trailing spaces of a textblock are not content.
fn trim_inline(mut nodes: Vec<MdNode>) -> Vec<MdNode> {
    if let Some(MdNode { kind: MdKind::Text(text), .. }) = nodes.first_mut() {
        *text = text.trim_start().to_string();
    }
    if let Some(MdNode { kind: MdKind::Text(text), .. }) = nodes.last_mut() {
        *text = text.trim_end().to_string();
    }
    nodes.retain(|node| !matches!(&node.kind, MdKind::Text(text) if text.is_empty()));
    nodes
}
