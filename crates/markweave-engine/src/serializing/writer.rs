//! Markdown tree to text.
//!
//! Blocks are separated by one blank line. Containers render their children
//! first and then prefix or indent the resulting lines.

use markweave_syntax::write_attributes;

use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::blocks::kinds::{AtxHeading, BlockQuote, CodeFence, DirectiveFence, TaskMarker, ThematicBreak};
use crate::parsing::inline::kinds::{CodeSpan, Emphasis, Link};
use crate::parsing::processor::Processor;

use super::escape::{Escaper, TextContext, escape_trailing};

pub struct Writer<'p> {
    processor: &'p Processor,
    escaper: Escaper,
}

/// Delimiters around inline content, chosen once the content is known.
enum Delims {
    Fixed(String, String),
    /// `_` unless a neighbour is alphanumeric, where only `*` works.
    Emphasis,
}

impl<'p> Writer<'p> {
    pub fn new(processor: &'p Processor) -> Self {
        Self {
            processor,
            escaper: Escaper::new(processor),
        }
    }

    /// Render a root node. Non-empty output ends with a newline.
    pub fn render(&self, root: &MdNode) -> String {
        let mut out = self.blocks(&root.children, false);
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// `tight` joins a list to the paragraph before it with a single newline,
    /// as inside list items.
    fn blocks(&self, nodes: &[MdNode], tight: bool) -> String {
        let mut out = String::new();
        let mut previous: Option<&MdNode> = None;
        // Orderedness and alternate-marker flag of the list just written
        let mut last_list: Option<(bool, bool)> = None;

        for node in nodes {
            let alternate = match (&node.kind, last_list) {
                (MdKind::List { ordered, .. }, Some((was_ordered, was_alternate))) if *ordered == was_ordered => {
                    !was_alternate
                }
                _ => false,
            };
            let text = self.block(node, alternate);
            if text.is_empty() && node.kind == MdKind::Paragraph {
                continue;
            }
            last_list = match node.kind {
                MdKind::List { ordered, .. } => Some((ordered, alternate)),
                _ => None,
            };
            if !out.is_empty() {
                let joins_tight = tight
                    && previous.is_some_and(|p| p.kind == MdKind::Paragraph)
                    && can_interrupt_paragraph(node, &text);
                out.push_str(if joins_tight { "\n" } else { "\n\n" });
            }
            out.push_str(&text);
            previous = Some(node);
        }
        out
    }

    fn block(&self, node: &MdNode, alternate: bool) -> String {
        match &node.kind {
            MdKind::Root => self.blocks(&node.children, false),
            MdKind::Paragraph => self.inline_block(&node.children, false),
            MdKind::Heading { depth } => {
                let text = self.inline_block(&node.children, true);
                let prefix = AtxHeading::prefix(*depth);
                if text.is_empty() { prefix } else { format!("{prefix} {text}") }
            }
            MdKind::ThematicBreak => ThematicBreak::CANONICAL.to_string(),
            MdKind::Blockquote => quote(&self.blocks(&node.children, false)),
            MdKind::List { ordered, start } => self.list(node, *ordered, *start, alternate),
            MdKind::ListItem { .. } => self.blocks(&node.children, true),
            MdKind::Code { lang, value } => code_block(lang.as_deref(), value),
            MdKind::ContainerDirective { name, attributes, raw } => {
                let body = if node.children.is_empty() {
                    raw.clone()
                } else {
                    self.blocks(&node.children, false)
                };
                let colons = container_colons(&body);
                let attrs = if attributes.is_empty() {
                    String::new()
                } else {
                    write_attributes(attributes)
                };
                if body.is_empty() {
                    format!("{colons}{name}{attrs}\n{colons}")
                } else {
                    format!("{colons}{name}{attrs}\n{body}\n{colons}")
                }
            }
            MdKind::LeafDirective { name, attributes } => {
                let colons = DirectiveFence::COLON.to_string().repeat(DirectiveFence::LEAF_COLONS);
                let attrs = if attributes.is_empty() {
                    String::new()
                } else {
                    write_attributes(attributes)
                };
                format!("{colons}{name}{attrs}")
            }
            // Inline content at block level
            _ => self.inline_block(std::slice::from_ref(node), false),
        }
    }

    fn list(&self, node: &MdNode, ordered: bool, start: u64, alternate: bool) -> String {
        let bullet = if alternate { '*' } else { '-' };
        let delim = if alternate { ')' } else { '.' };
        let mut items = Vec::with_capacity(node.children.len());
        for (n, item) in (0u64..).zip(&node.children) {
            let mut marker = if ordered {
                format!("{}{delim}", start.saturating_add(n))
            } else {
                bullet.to_string()
            };
            let indent = " ".repeat(marker.chars().count() + 1);
            if let MdKind::ListItem { checked: Some(checked) } = item.kind {
                marker.push(' ');
                marker.push_str(TaskMarker::write(checked));
            }

            let body = self.blocks(&item.children, true);
            let mut lines = body.split('\n');
            let mut text = match lines.next() {
                Some(first) if !first.is_empty() => format!("{marker} {first}"),
                _ => marker,
            };
            for line in lines {
                text.push('\n');
                if !line.is_empty() {
                    text.push_str(&indent);
                    text.push_str(line);
                }
            }
            items.push(text);
        }
        items.join("\n")
    }

    /// Inline content of a textblock. Trailing hard breaks and whitespace are
    /// dropped: markdown cannot express them.
    fn inline_block(&self, nodes: &[MdNode], single_line: bool) -> String {
        let end = nodes
            .iter()
            .rposition(|n| n.kind != MdKind::Break)
            .map_or(0, |i| i + 1);
        let mut ctx = TextContext {
            inside: Vec::new(),
            single_line,
        };
        let mut out = String::new();
        self.inline(&nodes[..end], &mut ctx, &mut out);
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out
    }

    fn inline(&self, nodes: &[MdNode], ctx: &mut TextContext, out: &mut String) {
        for (i, node) in nodes.iter().enumerate() {
            let next = nodes.get(i + 1);
            match &node.kind {
                MdKind::Text(value) | MdKind::Escaped(value) => self.escaper.write(value, ctx, out),
                MdKind::Break if ctx.single_line => out.push(' '),
                MdKind::Break => out.push_str("\\\n"),
                MdKind::InlineCode => out.push_str(&CodeSpan::wrap(&node.text_content())),
                MdKind::Strong => {
                    let run = Emphasis::STAR.to_string().repeat(2);
                    self.wrap(node, Delims::Fixed(run.clone(), run), next, ctx, out);
                }
                MdKind::Emphasis => self.wrap(node, Delims::Emphasis, next, ctx, out),
                MdKind::Delete => {
                    let run = Emphasis::TILDE.to_string().repeat(Emphasis::STRIKE_RUN);
                    self.wrap(node, Delims::Fixed(run.clone(), run), next, ctx, out);
                }
                MdKind::Decoration { name, flags } => match self.processor.find_decoration(name) {
                    Some(decoration) => {
                        let (open, close) = decoration.delimiters(flags);
                        escape_trailing(out, decoration.marker());
                        ctx.inside.push(decoration.marker());
                        self.wrap(node, Delims::Fixed(open, close), next, ctx, out);
                        ctx.inside.pop();
                    }
                    None => self.inline(&node.children, ctx, out),
                },
                MdKind::Link { url, title } => {
                    out.push(Link::OPEN);
                    self.inline(&node.children, ctx, out);
                    out.push(Link::CLOSE);
                    out.push(Link::DEST_OPEN);
                    out.push_str(&Link::write_destination(url));
                    if let Some(title) = title {
                        out.push(' ');
                        out.push_str(&Link::write_title(title));
                    }
                    out.push(Link::DEST_CLOSE);
                }
                MdKind::TextDirective { name, attributes } => {
                    escape_trailing(out, DirectiveFence::COLON);
                    out.push_str(&DirectiveFence::COLON.to_string().repeat(DirectiveFence::LEAF_COLONS));
                    out.push_str(name);
                    // Braces always, so following text cannot run into the name
                    out.push_str(&write_attributes(attributes));
                }
                _ => self.inline(&node.children, ctx, out),
            }
        }
    }

    /// Render children between delimiters. Whitespace at the edges moves
    /// outside the delimiters, where it does not stop them from matching.
    fn wrap(&self, node: &MdNode, delims: Delims, next: Option<&MdNode>, ctx: &mut TextContext, out: &mut String) {
        let before = out.chars().next_back();
        let start = out.len();
        self.inline(&node.children, ctx, out);
        // Escaping may trim spaces written before `start`
        let inner = out.split_off(start.min(out.len()));

        let core = inner.trim();
        if core.is_empty() {
            out.push_str(&inner);
            return;
        }
        let lead = &inner[..inner.len() - inner.trim_start().len()];
        let trail = &inner[inner.trim_end().len()..];

        let (open, close) = match delims {
            Delims::Fixed(open, close) => (open, close),
            Delims::Emphasis => {
                let before = if lead.is_empty() { before } else { Some(' ') };
                let after = if trail.is_empty() { next.and_then(first_char) } else { Some(' ') };
                let ch = if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
                    Emphasis::STAR
                } else {
                    Emphasis::UNDERSCORE
                };
                (ch.to_string(), ch.to_string())
            }
        };
        out.push_str(lead);
        out.push_str(&open);
        out.push_str(core);
        out.push_str(&close);
        out.push_str(trail);
    }
}

fn first_char(node: &MdNode) -> Option<char> {
    match &node.kind {
        MdKind::Text(value) | MdKind::Escaped(value) => value.chars().next(),
        _ => None,
    }
}

/// A list written right after a paragraph line must start a list there, not
/// continue the paragraph.
fn can_interrupt_paragraph(node: &MdNode, text: &str) -> bool {
    let MdKind::List { ordered, start } = node.kind else {
        return false;
    };
    let first_line = text.lines().next().unwrap_or_default();
    first_line.contains(' ') && (!ordered || start == 1)
}

fn quote(inner: &str) -> String {
    inner
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                BlockQuote::PREFIX.to_string()
            } else {
                format!("{}{line}", BlockQuote::LINE_PREFIX)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_block(lang: Option<&str>, value: &str) -> String {
    let fence = CodeFence::fence_for(value);
    let mut out = fence.clone();
    out.push_str(lang.unwrap_or_default());
    out.push('\n');
    if !value.is_empty() {
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(&fence);
    out
}

/// Three colons, or one more than any colon run opening a line of the body.
fn container_colons(body: &str) -> String {
    let longest = body
        .lines()
        .map(|line| line.trim_start().chars().take_while(|&c| c == DirectiveFence::COLON).count())
        .max()
        .unwrap_or(0);
    let count = (longest + 1).max(DirectiveFence::CONTAINER_COLONS);
    DirectiveFence::COLON.to_string().repeat(count)
}
