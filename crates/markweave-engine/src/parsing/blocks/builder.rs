use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::inline::parse_inline;
use crate::parsing::processor::Processor;

use super::classify::{CODE_INDENT, LineClass, Opener, classify, expand_tabs, strip_indent};
use super::kinds::{BlockQuote, CodeFence, FenceSig, ListMarker, TaskMarker};

/// Phase 2 of block parsing: turns classified lines into the markdown tree.
///
/// Containers (blockquotes, list items, container directives) collect their
/// de-prefixed lines and recurse, so nesting depth is unbounded.
pub struct BlockBuilder<'p> {
    processor: &'p Processor,
}

impl<'p> BlockBuilder<'p> {
    pub fn new(processor: &'p Processor) -> Self {
        Self { processor }
    }

    /// Parse a whole document into a `root` node.
    pub fn build(&self, text: &str) -> MdNode {
        let lines: Vec<String> = text.lines().map(expand_tabs).collect();
        MdNode::new(MdKind::Root, self.blocks(&lines))
    }

    fn blocks(&self, lines: &[String]) -> Vec<MdNode> {
        let mut out = Vec::new();
        let mut para: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let c = classify(&lines[i]);
            if c.is_blank {
                self.flush_paragraph(&mut para, &mut out);
                i += 1;
                continue;
            }
            let in_para = !para.is_empty();
            match c.opener {
                Some(Opener::SetextEquals) if in_para => {
                    out.push(self.setext(&mut para, 1));
                    i += 1;
                }
                Some(Opener::ThematicBreak { setext: true }) if in_para => {
                    out.push(self.setext(&mut para, 2));
                    i += 1;
                }
                Some(Opener::ThematicBreak { .. }) => {
                    self.flush_paragraph(&mut para, &mut out);
                    out.push(MdNode::leaf(MdKind::ThematicBreak));
                    i += 1;
                }
                Some(Opener::Fence(sig)) => {
                    self.flush_paragraph(&mut para, &mut out);
                    i = self.fence(lines, i, c.indent, &sig, &mut out);
                }
                Some(Opener::Heading { level, text }) => {
                    self.flush_paragraph(&mut para, &mut out);
                    out.push(MdNode::new(MdKind::Heading { depth: level }, parse_inline(&text)));
                    i += 1;
                }
                Some(Opener::Quote) => {
                    self.flush_paragraph(&mut para, &mut out);
                    i = self.quote(lines, i, &mut out);
                }
                Some(Opener::ListItem(marker)) if !in_para || interrupts_paragraph(&marker) => {
                    self.flush_paragraph(&mut para, &mut out);
                    i = self.list(lines, i, marker, &mut out);
                }
                Some(Opener::ContainerOpen { colons, name, attrs }) => {
                    self.flush_paragraph(&mut para, &mut out);
                    i = self.container(lines, i, colons, name, attrs, &mut out);
                }
                Some(Opener::Leaf { name, attrs }) => {
                    self.flush_paragraph(&mut para, &mut out);
                    out.push(MdNode::leaf(MdKind::LeafDirective {
                        name,
                        attributes: attrs,
                    }));
                    i += 1;
                }
                _ => {
                    para.push(c.text);
                    i += 1;
                }
            }
        }
        self.flush_paragraph(&mut para, &mut out);
        out
    }

    fn flush_paragraph(&self, para: &mut Vec<&str>, out: &mut Vec<MdNode>) {
        if para.is_empty() {
            return;
        }
        let text = para.join("\n");
        para.clear();
        out.push(MdNode::new(MdKind::Paragraph, parse_inline(text.trim_end())));
    }

    fn setext(&self, para: &mut Vec<&str>, depth: u8) -> MdNode {
        let text = para.join("\n");
        para.clear();
        MdNode::new(MdKind::Heading { depth }, parse_inline(text.trim_end()))
    }

    /// Collects a fenced code block. An unterminated fence runs to the end.
    fn fence(&self, lines: &[String], start: usize, indent: usize, sig: &FenceSig, out: &mut Vec<MdNode>) -> usize {
        let mut body = Vec::new();
        let mut j = start + 1;
        while j < lines.len() {
            let line = &lines[j];
            j += 1;
            let trimmed = line.trim_start_matches(' ');
            if line.len() - trimmed.len() < CODE_INDENT && CodeFence::closes(sig, trimmed) {
                break;
            }
            body.push(strip_indent(line, indent));
        }
        out.push(MdNode::leaf(MdKind::Code {
            lang: CodeFence::language(&sig.info),
            value: body.join("\n"),
        }));
        j
    }

    fn quote(&self, lines: &[String], start: usize, out: &mut Vec<MdNode>) -> usize {
        let mut inner: Vec<String> = Vec::new();
        let mut j = start;
        while j < lines.len() {
            let c = classify(&lines[j]);
            if matches!(c.opener, Some(Opener::Quote)) {
                let stripped = BlockQuote::strip_one(c.text).unwrap_or(c.text);
                inner.push(stripped.to_string());
            } else if is_lazy_continuation(&c, inner.last()) {
                inner.push(c.text.to_string());
            } else {
                break;
            }
            j += 1;
        }
        out.push(MdNode::new(MdKind::Blockquote, self.blocks(&inner)));
        j
    }

    fn list(&self, lines: &[String], start: usize, first: ListMarker, out: &mut Vec<MdNode>) -> usize {
        let mut items = Vec::new();
        let mut j = start;

        while j < lines.len() {
            let c = classify(&lines[j]);
            let Some(Opener::ListItem(marker)) = c.opener else {
                break;
            };
            if !first.continues(&marker) {
                break;
            }
            let content_indent = c.indent + marker.content_offset;
            let text = if marker.empty { "" } else { &c.text[marker.content_offset..] };
            let (checked, text) = match TaskMarker::parse(text) {
                Some((checked, rest)) => (Some(checked), rest),
                None => (None, text),
            };

            let mut body = vec![text.to_string()];
            j += 1;
            while j < lines.len() {
                let line = &lines[j];
                let lc = classify(line);
                if lc.is_blank {
                    body.push(String::new());
                } else if lc.indent >= content_indent {
                    body.push(strip_indent(line, content_indent).to_string());
                } else if is_lazy_continuation(&lc, body.last()) {
                    body.push(lc.text.to_string());
                } else {
                    break;
                }
                j += 1;
            }
            while body.last().is_some_and(|l| l.trim().is_empty()) {
                body.pop();
            }
            items.push(MdNode::new(MdKind::ListItem { checked }, self.blocks(&body)));
        }

        out.push(MdNode::new(
            MdKind::List {
                ordered: first.ordered,
                start: first.start,
            },
            items,
        ));
        j
    }

    /// Collects a container directive up to its matching close, skipping
    /// nested containers and code fences. Raw containers (mermaid) hold
    /// text, so only a close at least as long as the opener ends them.
    fn container(
        &self,
        lines: &[String],
        start: usize,
        colons: usize,
        name: String,
        attributes: Vec<markweave_syntax::DirectiveAttr>,
        out: &mut Vec<MdNode>,
    ) -> usize {
        let raw = self.processor.is_raw_container(&name);
        let mut body: Vec<String> = Vec::new();
        let mut depth = 0usize;
        let mut fence: Option<FenceSig> = None;
        let mut j = start + 1;

        while j < lines.len() {
            let line = &lines[j];
            j += 1;
            let c = classify(line);
            if raw {
                if matches!(c.opener, Some(Opener::ContainerClose { colons: n }) if n >= colons) {
                    break;
                }
                body.push(line.clone());
                continue;
            }
            if let Some(open) = &fence {
                if c.indent < CODE_INDENT && CodeFence::closes(open, c.text) {
                    fence = None;
                }
                body.push(line.clone());
                continue;
            }
            match &c.opener {
                Some(Opener::Fence(sig)) => fence = Some(sig.clone()),
                Some(Opener::ContainerOpen { .. }) => depth += 1,
                Some(Opener::ContainerClose { colons: n }) if depth == 0 && *n >= colons => break,
                Some(Opener::ContainerClose { .. }) => depth = depth.saturating_sub(1),
                _ => {}
            }
            body.push(line.clone());
        }

        let children = if raw {
            Vec::new()
        } else {
            self.blocks(&body)
        };
        out.push(MdNode::new(
            MdKind::ContainerDirective {
                name,
                attributes,
                raw: body.join("\n"),
            },
            children,
        ));
        j
    }
}

/// Only a non-empty bullet item or an ordered item numbered 1 may start a
/// list in the middle of a paragraph.
fn interrupts_paragraph(marker: &ListMarker) -> bool {
    !marker.empty && (!marker.ordered || marker.start == 1)
}

/// Paragraph text continued without its container prefix.
fn is_lazy_continuation(line: &LineClass<'_>, previous: Option<&String>) -> bool {
    if line.is_blank || line.opener.is_some() {
        return false;
    }
    previous.is_some_and(|prev| {
        let prev = classify(prev);
        !prev.is_blank && prev.opener.is_none()
    })
}
