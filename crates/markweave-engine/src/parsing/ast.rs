use markweave_syntax::DirectiveAttr;

/// Node type of the intermediate markdown tree, modelled on mdast.
///
/// Both directions go through this tree: the parser produces it from text and
/// the serializer produces it from a document before writing text.
#[derive(Debug, Clone, PartialEq)]
pub enum MdKind {
    Root,
    Paragraph,
    Heading { depth: u8 },
    ThematicBreak,
    Blockquote,
    List { ordered: bool, start: u64 },
    ListItem { checked: Option<bool> },
    Code { lang: Option<String>, value: String },
    /// `:::name{...}` ... `:::`. `raw` keeps the unparsed inner lines.
    ContainerDirective {
        name: String,
        attributes: Vec<DirectiveAttr>,
        raw: String,
    },
    /// `::name{...}` alone on a line.
    LeafDirective {
        name: String,
        attributes: Vec<DirectiveAttr>,
    },

    Text(String),
    /// Literal text from a backslash escape. Never merged with neighbouring
    /// text, so custom syntax cannot match across it.
    Escaped(String),
    Emphasis,
    Strong,
    Delete,
    /// Holds a single text child with the literal code.
    InlineCode,
    Break,
    Link { url: String, title: Option<String> },
    TextDirective {
        name: String,
        attributes: Vec<DirectiveAttr>,
    },
    /// Custom inline syntax such as `==highlight==`.
    Decoration { name: String, flags: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MdNode {
    pub kind: MdKind,
    pub children: Vec<MdNode>,
}

impl MdNode {
    pub fn new(kind: MdKind, children: Vec<MdNode>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: MdKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::leaf(MdKind::Text(value.into()))
    }

    /// mdast type name, for logs and tree dumps.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            MdKind::Root => "root",
            MdKind::Paragraph => "paragraph",
            MdKind::Heading { .. } => "heading",
            MdKind::ThematicBreak => "thematicBreak",
            MdKind::Blockquote => "blockquote",
            MdKind::List { .. } => "list",
            MdKind::ListItem { .. } => "listItem",
            MdKind::Code { .. } => "code",
            MdKind::ContainerDirective { .. } => "containerDirective",
            MdKind::LeafDirective { .. } => "leafDirective",
            MdKind::Text(_) | MdKind::Escaped(_) => "text",
            MdKind::Emphasis => "emphasis",
            MdKind::Strong => "strong",
            MdKind::Delete => "delete",
            MdKind::InlineCode => "inlineCode",
            MdKind::Break => "break",
            MdKind::Link { .. } => "link",
            MdKind::TextDirective { .. } => "textDirective",
            MdKind::Decoration { name, .. } => name,
        }
    }

    /// Literal value of a text-like node.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            MdKind::Text(v) | MdKind::Escaped(v) => Some(v),
            MdKind::Code { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Name of a directive node.
    pub fn directive_name(&self) -> Option<&str> {
        match &self.kind {
            MdKind::ContainerDirective { name, .. }
            | MdKind::LeafDirective { name, .. }
            | MdKind::TextDirective { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn directive_attr(&self, key: &str) -> Option<&str> {
        let attrs = match &self.kind {
            MdKind::ContainerDirective { attributes, .. }
            | MdKind::LeafDirective { attributes, .. }
            | MdKind::TextDirective { attributes, .. } => attributes,
            _ => return None,
        };
        attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(v) = self.value() {
            out.push_str(v);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Indented one-line-per-node rendering used in tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(0, &mut out);
        out
    }

    fn dump_into(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.type_name());
        match &self.kind {
            MdKind::Text(v) | MdKind::Escaped(v) => out.push_str(&format!(" {v:?}")),
            MdKind::Heading { depth } => out.push_str(&format!(" {depth}")),
            MdKind::List { ordered, start } => {
                if *ordered {
                    out.push_str(&format!(" ordered start={start}"));
                }
            }
            MdKind::ListItem { checked: Some(c) } => out.push_str(&format!(" checked={c}")),
            MdKind::Code { lang, value } => {
                out.push_str(&format!(" {:?} {value:?}", lang.as_deref().unwrap_or("")))
            }
            MdKind::Link { url, .. } => out.push_str(&format!(" {url}")),
            MdKind::Decoration { flags, .. } if !flags.is_empty() => out.push_str(&format!(" ={flags}=")),
            MdKind::ContainerDirective { name, attributes, .. }
            | MdKind::LeafDirective { name, attributes }
            | MdKind::TextDirective { name, attributes } => {
                out.push_str(&format!(" {name}"));
                for a in attributes {
                    out.push_str(&format!(" {}={}", a.key, a.value));
                }
            }
            _ => {}
        }
        out.push('\n');
        for child in &self.children {
            child.dump_into(depth + 1, out);
        }
    }
}
