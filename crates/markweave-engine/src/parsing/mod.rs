//! # Markdown to Document
//!
//! ```text
//! text ──BlockBuilder──▶ MdNode tree ──Processor::decorate──▶ MdNode tree
//!                                                                  │
//!                                  Document ◀──ParserState + rules─┘
//! ```
//!
//! The block pass and the inline pass build an mdast-shaped tree
//! ([`ast::MdNode`]). Custom syntax contributed by kinds is applied on that
//! tree, then each node is handed to the first registry rule that matches it.
//! Markdown the registry has no rule for is dropped with a debug log.

pub mod ast;
pub mod blocks;
pub mod inline;
pub mod processor;
pub mod state;

use tracing::debug;

use crate::models::Document;
use crate::registry::Registry;

use ast::MdNode;
use blocks::BlockBuilder;
use state::ParserState;

/// Parse markdown into a document valid for `registry`.
///
/// Returns `None` only for input that is not text (contains NUL); every
/// other input, empty included, yields a document with at least one block.
pub fn parse(registry: &Registry, markdown: &str) -> Option<Document> {
    if markdown.contains('\0') {
        debug!("refusing to parse input containing NUL");
        return None;
    }
    Some(from_markdown_tree(registry, &markdown_tree(registry, markdown)))
}

/// Run the registry rules over an already built markdown tree, e.g. one
/// mapped from clipboard HTML.
pub fn from_markdown_tree(registry: &Registry, tree: &MdNode) -> Document {
    let mut state = ParserState::new(registry);
    state.next(std::slice::from_ref(tree));
    Document::new(state.finish())
}

/// The decorated markdown tree for `markdown`, before any rule runs.
pub fn markdown_tree(registry: &Registry, markdown: &str) -> MdNode {
    let processor = registry.processor();
    let root = BlockBuilder::new(processor).build(markdown);
    processor.decorate(root)
}
