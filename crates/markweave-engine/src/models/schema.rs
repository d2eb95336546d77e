use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::content::ContentExpr;

/// Attribute values are plain JSON so structured embeds (`{id, name}`) fit
/// without a bespoke value type.
pub type AttrValue = serde_json::Value;

/// Ordered so equality, dumps and serialization are deterministic.
pub type Attrs = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Block,
    Inline,
    Mark,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Block => "block",
            Group::Inline => "inline",
            Group::Mark => "mark",
        }
    }
}

/// Structural role used by list-aware commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Plain,
    List,
    ListItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    pub name: String,
    pub default: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    #[error("kind {kind} has no attribute {attr}")]
    Unknown { kind: String, attr: String },
}

fn compute_attrs(kind: &str, specs: &[AttrSpec], given: Option<&Attrs>) -> Result<Attrs, AttrError> {
    let mut attrs: Attrs = specs
        .iter()
        .map(|s| (s.name.clone(), s.default.clone()))
        .collect();
    if let Some(given) = given {
        for (key, value) in given {
            if !attrs.contains_key(key) {
                return Err(AttrError::Unknown {
                    kind: kind.to_string(),
                    attr: key.clone(),
                });
            }
            attrs.insert(key.clone(), value.clone());
        }
    }
    Ok(attrs)
}

#[derive(Debug)]
pub struct NodeSpec {
    pub name: String,
    pub group: Group,
    pub content: ContentExpr,
    pub attrs: Vec<AttrSpec>,
    pub atom: bool,
    pub allows_marks: bool,
    pub code: bool,
    pub role: Role,
    /// Set by the registry once every referenced kind is known.
    pub inline_content: bool,
    /// Text contributed to plain-text extraction, e.g. `"\n"` for hard breaks.
    pub leaf_text: Option<String>,
}

/// Cheap handle to a registered node kind. Compares by name.
#[derive(Clone)]
pub struct NodeType(Arc<NodeSpec>);

impl NodeType {
    pub(crate) fn new(spec: NodeSpec) -> Self {
        Self(Arc::new(spec))
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn group(&self) -> Group {
        self.0.group
    }

    pub fn content(&self) -> &ContentExpr {
        &self.0.content
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn is_block(&self) -> bool {
        self.0.group == Group::Block
    }

    pub fn is_inline(&self) -> bool {
        self.0.group == Group::Inline
    }

    pub fn is_leaf(&self) -> bool {
        self.0.content.is_empty()
    }

    /// Atoms have no editable inside and are selected whole.
    pub fn is_atom(&self) -> bool {
        self.0.atom || self.is_leaf()
    }

    /// Block with inline content the cursor can enter. Atom blocks holding
    /// raw text (diagrams) do not count.
    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.0.inline_content && !self.0.atom
    }

    pub fn is_code(&self) -> bool {
        self.0.code
    }

    pub fn allows_marks(&self) -> bool {
        self.0.allows_marks && !self.0.code
    }

    pub fn compute_attrs(&self, given: Option<&Attrs>) -> Result<Attrs, AttrError> {
        compute_attrs(&self.0.name, &self.0.attrs, given)
    }

    /// Kinds share content rules when their expressions are identical, which
    /// is what allows joining a heading onto a paragraph.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.0.content == other.0.content
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.0.name)
    }
}

#[derive(Debug)]
pub struct MarkSpec {
    pub name: String,
    pub attrs: Vec<AttrSpec>,
    /// Registration order; lower ranks nest outside higher ones.
    pub rank: usize,
}

#[derive(Clone)]
pub struct MarkType(Arc<MarkSpec>);

impl MarkType {
    pub(crate) fn new(spec: MarkSpec) -> Self {
        Self(Arc::new(spec))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn rank(&self) -> usize {
        self.0.rank
    }

    pub fn compute_attrs(&self, given: Option<&Attrs>) -> Result<Attrs, AttrError> {
        compute_attrs(&self.0.name, &self.0.attrs, given)
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.0.name)
    }
}
