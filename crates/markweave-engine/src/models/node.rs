use std::fmt;
use std::sync::Arc;

use super::content::ContentItem;
use super::fragment::Fragment;
use super::schema::{AttrValue, Attrs, Group, MarkType, NodeType};

/// A mark attached to an inline leaf (bold, link, highlight...).
#[derive(Clone, PartialEq)]
pub struct Mark {
    ty: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub fn new(ty: MarkType, attrs: Attrs) -> Self {
        Self { ty, attrs }
    }

    pub fn ty(&self) -> &MarkType {
        &self.ty
    }

    pub fn kind_name(&self) -> &str {
        self.ty.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Sort by rank and keep the first mark of each kind.
    pub fn normalize(mut marks: Vec<Mark>) -> Vec<Mark> {
        marks.sort_by_key(|m| m.ty.rank());
        marks.dedup_by(|later, earlier| later.ty == earlier.ty);
        marks
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())?;
        write_attrs(f, &self.attrs)
    }
}

/// A run of text sharing one mark set.
#[derive(Clone, PartialEq)]
pub struct TextRun {
    text: String,
    len: usize,
    marks: Vec<Mark>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            len,
            marks: Mark::normalize(marks),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in positions (characters).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn has_mark(&self, ty: &MarkType) -> bool {
        self.marks.iter().any(|m| m.ty() == ty)
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            len,
            marks: self.marks.clone(),
        }
    }

    pub fn with_marks(&self, marks: Vec<Mark>) -> Self {
        Self {
            text: self.text.clone(),
            len: self.len,
            marks: Mark::normalize(marks),
        }
    }

    /// Replace any mark of the same kind with `mark`.
    pub fn add_mark(&self, mark: &Mark) -> Self {
        let mut marks: Vec<Mark> = self
            .marks
            .iter()
            .filter(|m| m.ty() != mark.ty())
            .cloned()
            .collect();
        marks.push(mark.clone());
        self.with_marks(marks)
    }

    pub fn remove_mark(&self, ty: &MarkType) -> Self {
        let marks = self
            .marks
            .iter()
            .filter(|m| m.ty() != ty)
            .cloned()
            .collect();
        self.with_marks(marks)
    }

    /// Character-offset substring.
    pub fn cut(&self, from: usize, to: usize) -> Self {
        let to = to.min(self.len);
        if from == 0 && to == self.len {
            return self.clone();
        }
        let start = char_to_byte(&self.text, from);
        let end = char_to_byte(&self.text, to);
        self.with_text(&self.text[start..end])
    }
}

pub(crate) fn char_to_byte(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(b, _)| b).unwrap_or(s.len())
}

impl fmt::Debug for TextRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)?;
        if !self.marks.is_empty() {
            write!(f, " {:?}", self.marks)?;
        }
        Ok(())
    }
}

impl NodeType {
    /// Children satisfy the content expression and carry marks only where
    /// marks are allowed.
    pub fn valid_content(&self, content: &Fragment) -> bool {
        if !self.content().matches(content.as_slice()) {
            return false;
        }
        self.allows_marks() || content.iter().all(|child| child.marks().is_empty())
    }
}

/// A non-text node: its kind, attributes and children.
#[derive(Clone, PartialEq)]
pub struct Element {
    ty: NodeType,
    attrs: Attrs,
    content: Fragment,
}

impl Element {
    /// Builds without validating content; callers that accept outside input
    /// go through [`NodeType::valid_content`] or the registry instead.
    pub fn new(ty: NodeType, attrs: Attrs, content: Fragment) -> Self {
        Self { ty, attrs, content }
    }

    pub fn ty(&self) -> &NodeType {
        &self.ty
    }

    pub fn kind_name(&self) -> &str {
        self.ty.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn child_count(&self) -> usize {
        self.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.content.child(index)
    }

    pub fn node_size(&self) -> usize {
        if self.ty.is_leaf() {
            1
        } else {
            self.content.size() + 2
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.ty.is_textblock()
    }

    /// Same kind and attributes, new children.
    pub fn copy(&self, content: Fragment) -> Self {
        Self {
            ty: self.ty.clone(),
            attrs: self.attrs.clone(),
            content,
        }
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Self {
        Self {
            ty: self.ty.clone(),
            attrs,
            content: self.content.clone(),
        }
    }

    pub fn has_markup(&self, ty: &NodeType, attrs: &Attrs) -> bool {
        &self.ty == ty && &self.attrs == attrs
    }

    pub fn cut(&self, from: usize, to: usize) -> Self {
        if from == 0 && to >= self.content.size() {
            return self.clone();
        }
        self.copy(self.content.cut(from, to))
    }

    pub fn text_content(&self) -> String {
        self.content.text_between(0, self.content.size(), "")
    }

    /// Cheap O(1) wrap into a shared [`Node`].
    pub fn into_node(self) -> Node {
        Node::Element(Arc::new(self))
    }

    /// Render as an indented tree, one node per line. Used by tests and the
    /// CLI `tree` command.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        dump_element(self, 0, &mut out);
        out
    }
}

fn dump_element(el: &Element, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(el.kind_name());
    if !el.attrs.is_empty() {
        let mut attrs = String::new();
        for (n, (k, v)) in el.attrs.iter().enumerate() {
            if n > 0 {
                attrs.push_str(", ");
            }
            attrs.push_str(&format!("{k}={v}"));
        }
        out.push_str(&format!(" {{{attrs}}}"));
    }
    out.push('\n');
    for child in el.content.iter() {
        match child {
            Node::Element(inner) => dump_element(inner, depth + 1, out),
            Node::Text(run) => {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(&format!("{run:?}\n"));
            }
        }
    }
}

fn write_attrs(f: &mut fmt::Formatter<'_>, attrs: &Attrs) -> fmt::Result {
    if attrs.values().all(AttrValue::is_null) {
        return Ok(());
    }
    f.write_str("{")?;
    let mut first = true;
    for (k, v) in attrs.iter().filter(|(_, v)| !v.is_null()) {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write!(f, "{k}={v}")?;
    }
    f.write_str("}")
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())?;
        write_attrs(f, &self.attrs)?;
        if !self.ty.is_leaf() {
            f.debug_list().entries(self.content.iter()).finish()?;
        }
        Ok(())
    }
}

/// A child in the document tree.
///
/// Elements are shared behind `Arc` so edits copy only the path from the
/// root to the changed node.
#[derive(Clone, PartialEq)]
pub enum Node {
    Element(Arc<Element>),
    Text(TextRun),
}

impl Node {
    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node::Text(TextRun::new(text, marks))
    }

    pub fn kind_name(&self) -> &str {
        match self {
            Node::Element(el) => el.kind_name(),
            Node::Text(_) => "text",
        }
    }

    pub fn node_size(&self) -> usize {
        match self {
            Node::Element(el) => el.node_size(),
            Node::Text(run) => run.len(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Element(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Element(el) if el.ty().is_block())
    }

    pub fn is_inline(&self) -> bool {
        !self.is_block()
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Node::Element(el) if el.ty().is_atom())
    }

    pub fn is_leaf(&self) -> bool {
        match self {
            Node::Element(el) => el.ty().is_leaf(),
            Node::Text(_) => true,
        }
    }

    pub fn is_textblock(&self) -> bool {
        matches!(self, Node::Element(el) if el.is_textblock())
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Text(run) => run.marks(),
            Node::Element(_) => &[],
        }
    }

    pub fn content(&self) -> Option<&Fragment> {
        self.as_element().map(Element::content)
    }

    pub fn cut(&self, from: usize, to: usize) -> Node {
        match self {
            Node::Text(run) => Node::Text(run.cut(from, to)),
            Node::Element(el) => {
                if from == 0 && to >= el.content().size() {
                    self.clone()
                } else {
                    el.cut(from, to).into_node()
                }
            }
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(run) => run.text().to_string(),
            Node::Element(el) => el.text_content(),
        }
    }

    /// Two text runs that can merge into one.
    pub fn same_markup(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Text(a), Node::Text(b)) => a.marks() == b.marks(),
            (Node::Element(a), Node::Element(b)) => a.ty() == b.ty() && a.attrs() == b.attrs(),
            _ => false,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        el.into_node()
    }
}

impl ContentItem for Node {
    fn kind_name(&self) -> &str {
        Node::kind_name(self)
    }

    fn group(&self) -> Group {
        match self {
            Node::Element(el) => el.ty().group(),
            Node::Text(_) => Group::Inline,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(el) => el.fmt(f),
            Node::Text(run) => run.fmt(f),
        }
    }
}
