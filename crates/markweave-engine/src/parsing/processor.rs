//! # Syntax Processor
//!
//! Custom inline syntax contributed by kinds through their `before_init`
//! hooks, applied to the markdown tree after the inline parse.
//!
//! ## Decoration Shapes
//!
//! ```text
//! Double { flags: true }   ==text==   =r=text==
//! Double { flags: false }  ++text++
//! Single                   ~text~     ^text^
//! ```
//!
//! Decorations match over text. Other inline nodes (code spans, strong,
//! escaped characters) can sit inside a decoration but never act as its
//! delimiter, and code is never decorated inside.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::warn;

use super::ast::{MdKind, MdNode};

/// Stands in for a non-text node while matching.
const OBJECT_MASK: char = '\u{FFFC}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Doubled marker on both sides, optionally with a `=flags=` opener.
    Double { flags: bool },
    /// One marker on each side.
    Single,
}

#[derive(Debug, Clone)]
pub struct Decoration {
    name: String,
    marker: char,
    shape: Shape,
    regex: Regex,
}

impl Decoration {
    pub fn new(name: impl Into<String>, marker: char, shape: Shape) -> Result<Self, regex::Error> {
        let m = regex::escape(&marker.to_string());
        let pattern = match shape {
            Shape::Double { flags } => {
                let flags = if flags { "([a-z0-9]{0,2})" } else { "()" };
                format!(r"{m}{flags}{m}\s*([^{m}]*[^ ])\s*{m}{m}")
            }
            Shape::Single => format!(r"(){m}([^{m}\s][^{m}]*?){m}"),
        };
        Ok(Self {
            name: name.into(),
            marker,
            shape,
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Opening and closing delimiters for serialization.
    pub fn delimiters(&self, flags: &str) -> (String, String) {
        let m = self.marker;
        match self.shape {
            Shape::Double { flags: true } => (format!("{m}{flags}{m}"), format!("{m}{m}")),
            Shape::Double { flags: false } => (format!("{m}{m}"), format!("{m}{m}")),
            Shape::Single => (m.to_string(), m.to_string()),
        }
    }
}

/// Registered custom syntax, built once per registry.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    decorations: Vec<Decoration>,
    raw_containers: BTreeSet<String>,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inline decoration. Later registrations of the same name
    /// are ignored.
    pub fn decoration(&mut self, name: &str, marker: char, shape: Shape) {
        if self.decorations.iter().any(|d| d.name == name) {
            return;
        }
        match Decoration::new(name, marker, shape) {
            Ok(d) => self.decorations.push(d),
            Err(error) => warn!(name, %error, "invalid decoration syntax"),
        }
    }

    /// Container directives whose body is kept as raw text instead of being
    /// parsed as markdown.
    pub fn raw_container(&mut self, name: &str) {
        self.raw_containers.insert(name.to_string());
    }

    pub fn is_raw_container(&self, name: &str) -> bool {
        self.raw_containers.contains(name)
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn find_decoration(&self, name: &str) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.name == name)
    }

    /// Characters that open a decoration.
    pub fn markers(&self) -> impl Iterator<Item = (char, Shape)> + '_ {
        self.decorations.iter().map(|d| (d.marker, d.shape))
    }

    /// Apply every decoration to the text below `node`.
    pub fn decorate(&self, node: MdNode) -> MdNode {
        if self.decorations.is_empty() {
            return node;
        }
        let MdNode { kind, children } = node;
        match kind {
            MdKind::InlineCode | MdKind::Code { .. } => MdNode::new(kind, children),
            kind => MdNode::new(kind, self.decorate_children(children)),
        }
    }

    fn decorate_children(&self, children: Vec<MdNode>) -> Vec<MdNode> {
        let mut run = TextRun::default();
        for child in children {
            match child.kind {
                MdKind::Text(value) => run.push_text(&value),
                kind => run.push_object(self.decorate(MdNode::new(kind, child.children))),
            }
        }
        self.decorate_run(run)
    }

    /// Split a run at the earliest decoration match, recursing into the
    /// match and the rest.
    fn decorate_run(&self, run: TextRun) -> Vec<MdNode> {
        if run.masked.is_empty() {
            return Vec::new();
        }
        let best = self
            .decorations
            .iter()
            .filter_map(|d| d.regex.captures(&run.masked).map(|c| (d, c)))
            .min_by_key(|(_, c)| c.get(0).map_or(usize::MAX, |m| m.start()));

        let Some((decoration, caps)) = best else {
            return run.into_nodes();
        };
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(2)) else {
            return run.into_nodes();
        };
        let flags = caps.get(1).map_or("", |m| m.as_str()).to_string();

        let mut out = run.slice(0, whole.start()).into_nodes();
        out.push(MdNode::new(
            MdKind::Decoration {
                name: decoration.name.clone(),
                flags,
            },
            self.decorate_run(run.slice(content.start(), content.end())),
        ));
        out.extend(self.decorate_run(run.slice(whole.end(), run.masked.len())));
        out
    }
}

/// Sibling nodes flattened to a string for matching. Every node that is not
/// plain text, escapes included, stands in the string as [`OBJECT_MASK`].
#[derive(Debug, Default)]
struct TextRun {
    masked: String,
    objects: Vec<MdNode>,
}

impl TextRun {
    fn push_text(&mut self, value: &str) {
        for c in value.chars() {
            if c == OBJECT_MASK {
                self.push_object(MdNode::text(c.to_string()));
            } else {
                self.masked.push(c);
            }
        }
    }

    fn push_object(&mut self, node: MdNode) {
        self.objects.push(node);
        self.masked.push(OBJECT_MASK);
    }

    fn slice(&self, start: usize, end: usize) -> TextRun {
        let skip = self.masked[..start].matches(OBJECT_MASK).count();
        let masked = self.masked[start..end].to_string();
        let take = masked.matches(OBJECT_MASK).count();
        let objects = self.objects.iter().skip(skip).take(take).cloned().collect();
        TextRun { masked, objects }
    }

    fn into_nodes(self) -> Vec<MdNode> {
        let mut out = Vec::new();
        let mut text = String::new();
        let mut objects = self.objects.into_iter();
        for c in self.masked.chars() {
            if c != OBJECT_MASK {
                text.push(c);
                continue;
            }
            if !text.is_empty() {
                out.push(MdNode::text(std::mem::take(&mut text)));
            }
            out.extend(objects.next());
        }
        if !text.is_empty() {
            out.push(MdNode::text(text));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn processor() -> Processor {
        let mut p = Processor::new();
        p.decoration("underline", '+', Shape::Double { flags: false });
        p.decoration("highlight", '=', Shape::Double { flags: true });
        p.decoration("subscript", '~', Shape::Single);
        p.decoration("superscript", '^', Shape::Single);
        p
    }

    fn para(children: Vec<MdNode>) -> MdNode {
        MdNode::new(MdKind::Paragraph, children)
    }

    #[test]
    fn highlight_with_flags() {
        let out = processor().decorate(para(vec![MdNode::text("a =r=red== b")]));
        assert_snapshot!(out.dump(), @r#"
        paragraph
          text "a "
          highlight =r=
            text "red"
          text " b"
        "#);
    }

    #[test]
    fn nested_decorations_either_order() {
        let p = processor();
        let a = p.decorate(para(vec![MdNode::text("++==x==++")]));
        let b = p.decorate(para(vec![MdNode::text("==++x++==")]));
        assert_eq!(a.children[0].type_name(), "underline");
        assert_eq!(a.children[0].children[0].type_name(), "highlight");
        assert_eq!(b.children[0].type_name(), "highlight");
        assert_eq!(b.children[0].children[0].type_name(), "underline");
    }

    #[rstest]
    #[case("H~2~O", "subscript")]
    #[case("x^2^", "superscript")]
    #[case("++under++", "underline")]
    fn single_decorations(#[case] input: &str, #[case] expected: &str) {
        let out = processor().decorate(para(vec![MdNode::text(input)]));
        assert!(out.children.iter().any(|c| c.type_name() == expected), "{}", out.dump());
    }

    #[test]
    fn escaped_marker_does_not_decorate() {
        let out = processor().decorate(para(vec![
            MdNode::leaf(MdKind::Escaped("=".into())),
            MdNode::text("=x=="),
        ]));
        assert!(out.children.iter().all(|c| c.type_name() == "text"), "{}", out.dump());
    }

    #[test]
    fn escaped_character_inside_decoration_is_kept() {
        let out = processor().decorate(para(vec![
            MdNode::text("==a"),
            MdNode::leaf(MdKind::Escaped("=".into())),
            MdNode::text("b=="),
        ]));
        assert_eq!(out.children.len(), 1);
        assert_eq!(out.children[0].text_content(), "a=b");
    }

    #[test]
    fn decoration_spans_other_inline_nodes() {
        let out = processor().decorate(para(vec![
            MdNode::text("=="),
            MdNode::new(MdKind::Strong, vec![MdNode::text("x")]),
            MdNode::text("=="),
        ]));
        assert_snapshot!(out.dump(), @r#"
        paragraph
          highlight
            strong
              text "x"
        "#);
    }

    #[test]
    fn code_is_never_decorated() {
        let code = MdNode::new(MdKind::InlineCode, vec![MdNode::text("==x==")]);
        let out = processor().decorate(para(vec![code.clone()]));
        assert_eq!(out.children, vec![code]);
    }
}
