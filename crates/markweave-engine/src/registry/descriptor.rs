use std::fmt;
use std::sync::Arc;

use crate::models::{AttrSpec, AttrValue, Element, Group, Mark, MarkType, NodeType, Role};
use crate::parsing::ast::MdNode;
use crate::parsing::processor::Processor;
use crate::parsing::state::ParserState;
use crate::serializing::state::SerializerState;

/// The registered type an entry stands for.
#[derive(Debug, Clone)]
pub enum Kind {
    Node(NodeType),
    Mark(MarkType),
}

impl Kind {
    pub fn name(&self) -> &str {
        match self {
            Kind::Node(ty) => ty.name(),
            Kind::Mark(ty) => ty.name(),
        }
    }

    pub fn as_node(&self) -> Option<&NodeType> {
        match self {
            Kind::Node(ty) => Some(ty),
            Kind::Mark(_) => None,
        }
    }

    pub fn as_mark(&self) -> Option<&MarkType> {
        match self {
            Kind::Mark(ty) => Some(ty),
            Kind::Node(_) => None,
        }
    }
}

/// Markdown tree to document.
pub trait MarkdownParse: Send + Sync {
    fn matches(&self, node: &MdNode) -> bool;
    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind);
}

/// Document to markdown tree.
pub trait MarkdownSerialize: Send + Sync {
    /// Write a node. The default keeps only the children.
    fn node(&self, state: &mut SerializerState<'_>, el: &Element) {
        state.children(el);
    }

    /// The markdown node that wraps text carrying `mark`.
    fn mark(&self, _mark: &Mark) -> Option<MdNode> {
        None
    }
}

/// Custom syntax registration, run once while the registry is built.
pub trait SyntaxHooks: Send + Sync {
    fn before_init(&self, _processor: &mut Processor) {}
    fn after_init(&self, _processor: &mut Processor) {}
}

/// Everything an extension declares about one kind.
#[derive(Clone)]
pub struct KindDescriptor {
    pub(crate) name: String,
    pub(crate) group: Group,
    pub(crate) content: String,
    pub(crate) attrs: Vec<AttrSpec>,
    pub(crate) atom: bool,
    pub(crate) allows_marks: bool,
    pub(crate) code: bool,
    pub(crate) role: Role,
    pub(crate) leaf_text: Option<String>,
    pub(crate) parser: Option<Arc<dyn MarkdownParse>>,
    pub(crate) serializer: Option<Arc<dyn MarkdownSerialize>>,
    pub(crate) hooks: Option<Arc<dyn SyntaxHooks>>,
}

impl KindDescriptor {
    pub fn node(name: &str, group: Group) -> Self {
        Self {
            name: name.to_string(),
            group,
            content: String::new(),
            attrs: Vec::new(),
            atom: false,
            allows_marks: true,
            code: false,
            role: Role::Plain,
            leaf_text: None,
            parser: None,
            serializer: None,
            hooks: None,
        }
    }

    pub fn mark(name: &str) -> Self {
        Self::node(name, Group::Mark)
    }

    pub fn content(mut self, expr: &str) -> Self {
        self.content = expr.to_string();
        self
    }

    pub fn attr(mut self, name: &str, default: AttrValue) -> Self {
        self.attrs.push(AttrSpec {
            name: name.to_string(),
            default,
        });
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn no_marks(mut self) -> Self {
        self.allows_marks = false;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self.allows_marks = false;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn leaf_text(mut self, text: &str) -> Self {
        self.leaf_text = Some(text.to_string());
        self
    }

    pub fn parser(mut self, parser: impl MarkdownParse + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn serializer(mut self, serializer: impl MarkdownSerialize + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn hooks(mut self, hooks: impl SyntaxHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Group {
        self.group
    }
}

impl fmt::Debug for KindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDescriptor")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}
