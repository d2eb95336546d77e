//! # Kind Registry
//!
//! The registry owns every node and mark kind the engine knows, in
//! registration order, and is the only place markdown rules are looked up.
//!
//! ## Composition
//!
//! ```text
//! [Extension] ──options──▶ [KindDescriptor]* ──validate──▶ Registry
//!      ▲                                                    │
//!   ConfigMap (false | true | {opts})          by name: O(1) map
//!                                              parse rules: first match in order
//! ```
//!
//! Building a registry never fails. Descriptors with broken content
//! expressions, unknown references or duplicate names are left out with a
//! warning. `doc`, `paragraph` and `text` are always present.

pub mod descriptor;
pub mod kinds;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{
    Attrs, ContentExpr, Document, Element, Filled, Fragment, Group, MarkSpec, MarkType, Node, NodeSpec, NodeType,
};
use crate::parsing::processor::Processor;

pub use descriptor::{Kind, KindDescriptor, MarkdownParse, MarkdownSerialize, SyntaxHooks};

/// Extension options: a JSON object.
pub type Options = Map<String, Value>;

/// A bundle of kinds with configurable options.
pub trait Extension: Send + Sync {
    fn name(&self) -> &'static str;

    fn default_options(&self) -> Options {
        Options::new()
    }

    /// One or more kinds; lists contribute both the list and its items.
    fn descriptors(&self, options: &Options) -> Vec<KindDescriptor>;
}

/// Per-extension configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionConfig {
    Disabled,
    Defaults,
    /// Shallow-merged over the extension's defaults.
    Options(Options),
}

impl From<bool> for ExtensionConfig {
    fn from(enabled: bool) -> Self {
        if enabled {
            ExtensionConfig::Defaults
        } else {
            ExtensionConfig::Disabled
        }
    }
}

/// Extension name to configuration. Missing entries mean defaults.
pub type ConfigMap = BTreeMap<String, ExtensionConfig>;

/// Kinds every registry carries whatever the configuration says.
pub const CORE_KINDS: [&str; 3] = ["doc", "paragraph", "text"];

/// Fill recursion stops here; only a cyclic set of required kinds gets this deep.
const MAX_FILL_DEPTH: usize = 16;

struct Entry {
    kind: Kind,
    parser: Option<Arc<dyn MarkdownParse>>,
    serializer: Option<Arc<dyn MarkdownSerialize>>,
}

/// One parse rule, yielded in registration order.
pub struct ParseRule<'r> {
    pub kind: &'r Kind,
    pub parser: &'r dyn MarkdownParse,
}

pub struct Registry {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    processor: Processor,
    doc: NodeType,
    paragraph: NodeType,
}

impl Registry {
    /// The starter kit with default options.
    pub fn standard() -> Registry {
        compose(&kinds::starter_kit(), &ConfigMap::new())
    }

    pub fn kind(&self, name: &str) -> Option<&Kind> {
        self.by_name.get(name).map(|&i| &self.entries[i].kind)
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.kind(name).and_then(Kind::as_node)
    }

    pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
        self.kind(name).and_then(Kind::as_mark)
    }

    pub fn serializer(&self, name: &str) -> Option<&dyn MarkdownSerialize> {
        let entry = &self.entries[*self.by_name.get(name)?];
        entry.serializer.as_deref()
    }

    /// Parse rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = ParseRule<'_>> {
        self.entries.iter().filter_map(|e| {
            e.parser.as_deref().map(|parser| ParseRule {
                kind: &e.kind,
                parser,
            })
        })
    }

    /// Kind names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.kind.name())
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn doc_type(&self) -> &NodeType {
        &self.doc
    }

    pub fn paragraph_type(&self) -> &NodeType {
        &self.paragraph
    }

    /// The smallest valid node of a kind or group. `block` fills with a
    /// paragraph; inline content cannot be filled.
    pub fn create_and_fill(&self, name: &str) -> Option<Node> {
        self.create_and_fill_at(name, 0)
    }

    fn create_and_fill_at(&self, name: &str, depth: usize) -> Option<Node> {
        if depth > MAX_FILL_DEPTH {
            return None;
        }
        let ty = match name {
            "block" => &self.paragraph,
            _ => self.node_type(name)?,
        };
        if ty.name() == "text" || (!ty.is_block() && !ty.is_atom()) {
            return None;
        }
        let attrs = ty.compute_attrs(None).ok()?;
        self.fill_at(ty, attrs, Vec::new(), depth)
            .map(Element::into_node)
    }

    /// Build a node, inserting required children the content lacks.
    /// `None` when some of `content` cannot be placed.
    pub fn fill(&self, ty: &NodeType, attrs: Attrs, content: Vec<Node>) -> Option<Element> {
        self.fill_at(ty, attrs, content, 0)
    }

    fn fill_at(&self, ty: &NodeType, attrs: Attrs, content: Vec<Node>, depth: usize) -> Option<Element> {
        let slots = ty.content().fill(&content)?;
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Filled::Item(i) => out.push(content[i].clone()),
                Filled::Missing(name) => out.push(self.create_and_fill_at(name, depth + 1)?),
            }
        }
        Some(Element::new(ty.clone(), attrs, Fragment::from_vec(out)))
    }
}

impl Document {
    /// A `doc` holding one empty paragraph.
    pub fn empty(registry: &Registry) -> Document {
        let paragraph = Element::new(registry.paragraph_type().clone(), Attrs::new(), Fragment::empty());
        Document::new(Element::new(
            registry.doc_type().clone(),
            Attrs::new(),
            Fragment::from_node(paragraph.into_node()),
        ))
    }
}

/// Shallow merge: configured keys replace defaults.
pub fn merge_options(defaults: Options, configured: &Options) -> Options {
    let mut out = defaults;
    for (key, value) in configured {
        out.insert(key.clone(), value.clone());
    }
    out
}

/// Build a registry from extensions in order.
pub fn compose(extensions: &[Arc<dyn Extension>], config: &ConfigMap) -> Registry {
    let mut descriptors: Vec<KindDescriptor> = Vec::new();
    for ext in extensions {
        let name = ext.name();
        let options = match config.get(name).unwrap_or(&ExtensionConfig::Defaults) {
            ExtensionConfig::Disabled if CORE_KINDS.contains(&name) => {
                warn!(extension = name, "core extension cannot be disabled");
                ext.default_options()
            }
            ExtensionConfig::Disabled => {
                debug!(extension = name, "extension disabled");
                continue;
            }
            ExtensionConfig::Defaults => ext.default_options(),
            ExtensionConfig::Options(configured) => merge_options(ext.default_options(), configured),
        };
        descriptors.extend(ext.descriptors(&options));
    }

    let mut seen = HashSet::new();
    descriptors.retain(|d| {
        let first = seen.insert(d.name.clone());
        if !first {
            warn!(kind = %d.name, "duplicate kind, keeping the first registration");
        }
        first
    });

    let mut parsed: Vec<(KindDescriptor, ContentExpr)> = descriptors
        .into_iter()
        .filter_map(|d| match ContentExpr::parse(&d.content) {
            Ok(expr) => Some((d, expr)),
            Err(error) => {
                warn!(kind = %d.name, %error, "omitting kind with invalid content expression");
                None
            }
        })
        .collect();

    drop_unknown_references(&mut parsed);
    ensure_core(&mut parsed);

    let inline: HashSet<String> = parsed
        .iter()
        .filter(|(d, _)| d.group == Group::Inline)
        .map(|(d, _)| d.name.clone())
        .collect();

    let mut entries = Vec::with_capacity(parsed.len());
    let mut by_name = HashMap::with_capacity(parsed.len());
    let mut hooks = Vec::new();
    let mut mark_rank = 0;
    for (d, content) in parsed {
        let kind = if d.group == Group::Mark {
            let spec = MarkSpec {
                name: d.name.clone(),
                attrs: d.attrs,
                rank: mark_rank,
            };
            mark_rank += 1;
            Kind::Mark(MarkType::new(spec))
        } else {
            let inline_content = content
                .references()
                .any(|r| r == Group::Inline.as_str() || inline.contains(r));
            Kind::Node(NodeType::new(NodeSpec {
                name: d.name.clone(),
                group: d.group,
                content,
                attrs: d.attrs,
                atom: d.atom,
                allows_marks: d.allows_marks,
                code: d.code,
                role: d.role,
                inline_content,
                leaf_text: d.leaf_text,
            }))
        };
        debug!(kind = %d.name, group = d.group.as_str(), "registered kind");
        by_name.insert(d.name, entries.len());
        entries.push(Entry {
            kind,
            parser: d.parser,
            serializer: d.serializer,
        });
        hooks.extend(d.hooks);
    }

    let mut processor = Processor::new();
    for h in &hooks {
        h.before_init(&mut processor);
    }
    for h in &hooks {
        h.after_init(&mut processor);
    }

    let core_type = |name: &str| -> NodeType {
        match by_name.get(name).map(|&i| &entries[i].kind) {
            Some(Kind::Node(ty)) => ty.clone(),
            _ => kinds::core::fallback_type(name),
        }
    };
    let doc = core_type("doc");
    let paragraph = core_type("paragraph");

    Registry {
        entries,
        by_name,
        processor,
        doc,
        paragraph,
    }
}

/// Omit kinds whose content refers to kinds that are not registered, until
/// nothing changes: an omission can orphan another kind.
fn drop_unknown_references(parsed: &mut Vec<(KindDescriptor, ContentExpr)>) {
    loop {
        let names: HashSet<String> = parsed
            .iter()
            .filter(|(d, _)| d.group != Group::Mark)
            .map(|(d, _)| d.name.clone())
            .collect();
        let before = parsed.len();
        parsed.retain(|(d, expr)| {
            let unknown = expr
                .references()
                .find(|r| !names.contains(*r) && *r != Group::Block.as_str() && *r != Group::Inline.as_str());
            if let Some(reference) = unknown {
                warn!(kind = %d.name, reference, "omitting kind with unknown content reference");
                return false;
            }
            true
        });
        if parsed.len() == before {
            break;
        }
    }
}

/// Put back any core kind that is missing, in front, in core order.
fn ensure_core(parsed: &mut Vec<(KindDescriptor, ContentExpr)>) {
    let mut missing = Vec::new();
    for d in kinds::core::descriptors() {
        if parsed.iter().any(|(p, _)| p.name == d.name) {
            continue;
        }
        if let Ok(expr) = ContentExpr::parse(&d.content) {
            missing.push((d, expr));
        }
    }
    if !missing.is_empty() {
        missing.append(parsed);
        *parsed = missing;
    }
}
