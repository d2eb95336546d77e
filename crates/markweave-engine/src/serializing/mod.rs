//! # Document to Markdown
//!
//! ```text
//! Document ──kind serializers + SerializerState──▶ MdNode tree ──Writer──▶ text
//! ```
//!
//! Kinds without a serializer write their children only; nothing here fails.

pub mod escape;
pub mod state;
pub mod writer;

use crate::models::{Document, Element};
use crate::parsing::ast::MdNode;
use crate::registry::Registry;

use state::SerializerState;
use writer::Writer;

/// Serialize a document to markdown.
pub fn serialize(registry: &Registry, doc: &Document) -> String {
    serialize_element(registry, doc.root())
}

/// Serialize any element as if it were a document root, e.g. the blocks of a
/// clipboard slice.
pub fn serialize_element(registry: &Registry, el: &Element) -> String {
    Writer::new(registry.processor()).render(&markdown_tree(registry, el))
}

/// The markdown tree an element serializes to.
pub fn markdown_tree(registry: &Registry, el: &Element) -> MdNode {
    let mut state = SerializerState::new(registry);
    state.element(el);
    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(b: &Builder, blocks: Vec<Node>) -> String {
        serialize(&b.registry, &Document::new(b.doc(blocks)))
    }

    #[test]
    fn mark_order_does_not_change_the_output() {
        let b = builder();
        let red = b.mark_with("highlight", attrs(&[("color", json!("red"))]));
        let bold = b.mark("bold");
        let one = Node::text("hot", vec![bold.clone(), red.clone()]);
        let other = Node::text("hot", vec![red, bold]);

        let first = write(&b, vec![b.p(vec![one, b.text(" news")])]);
        let second = write(&b, vec![b.p(vec![other, b.text(" news")])]);
        assert_eq!(first, "**=r=hot==** news\n");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_paragraphs_are_skipped() {
        let b = builder();
        let out = write(&b, vec![b.p(vec![]), b.p(vec![b.text("a")]), b.p(vec![])]);
        assert_eq!(out, "a\n");
    }

    #[test]
    fn adjacent_lists_alternate_markers() {
        let b = builder();
        let out = write(
            &b,
            vec![
                b.ul(vec![b.li(vec![b.p(vec![b.text("a")])])]),
                b.ul(vec![b.li(vec![b.p(vec![b.text("b")])])]),
            ],
        );
        assert_eq!(out, "- a\n\n* b\n");
    }

    #[test]
    fn empty_document_is_empty_text() {
        let b = builder();
        assert_eq!(write(&b, vec![b.p(vec![])]), "");
    }
}
