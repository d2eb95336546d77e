//! # Clipboard Bridge
//!
//! ```text
//! copy:   selection ──slice──┬── rich: <div data-markweave-slice=json> markdown as html </div>
//!                            └── plain: leaf text, blocks joined by a blank line
//!
//! paste:  1. rich slice ─▶ 2. external html ─▶ 3. markdown-looking text ─▶ 4. literal text
//! ```
//!
//! Reading never fails: a tier that cannot make sense of the payload hands
//! it to the next one.

pub mod detect;
pub mod html;
pub mod rich;

use pulldown_cmark::{Options, Parser};
use tracing::debug;

use crate::editing::Selection;
use crate::models::{Attrs, Document, Element, Node, Slice};
use crate::parsing;
use crate::registry::Registry;
use crate::serializing::serialize_element;

pub const HTML_MIME: &str = "text/html";
pub const PLAIN_MIME: &str = "text/plain";

/// Outbound clipboard content, one string per MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardData {
    pub html: String,
    pub plain: String,
}

impl ClipboardData {
    pub fn parts(&self) -> [(&'static str, &str); 2] {
        [(HTML_MIME, &self.html), (PLAIN_MIME, &self.plain)]
    }
}

/// Inbound clipboard content as the host received it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub plain: String,
}

impl ClipboardPayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            html: None,
            plain: text.into(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

impl From<ClipboardData> for ClipboardPayload {
    fn from(data: ClipboardData) -> Self {
        Self {
            html: Some(data.html),
            plain: data.plain,
        }
    }
}

/// What a paste resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Pasted {
    Slice(Slice),
    /// Literal text, inserted as typed.
    Text(String),
}

/// Clipboard content for the selected part of `doc`.
pub fn to_clipboard(registry: &Registry, doc: &Element, selection: Selection) -> ClipboardData {
    match doc.slice(selection.from(), selection.to(doc)) {
        Ok(slice) => slice_data(registry, &slice),
        Err(error) => {
            debug!(%error, "selection does not slice, copying nothing");
            ClipboardData::default()
        }
    }
}

pub fn slice_data(registry: &Registry, slice: &Slice) -> ClipboardData {
    if slice.content.is_empty() {
        return ClipboardData::default();
    }
    let holder = Element::new(registry.doc_type().clone(), Attrs::new(), slice.content.clone());
    let markdown = serialize_element(registry, &holder);
    let mut rendered = String::new();
    pulldown_cmark::html::push_html(
        &mut rendered,
        Parser::new_ext(&markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS),
    );
    ClipboardData {
        html: rich::wrap(slice, &rendered),
        plain: plain_text(slice),
    }
}

/// Leaf text of a slice. Hard breaks give `\n`, inline embeds nothing.
pub fn plain_text(slice: &Slice) -> String {
    slice.content.text_between(0, slice.content.size(), "\n\n")
}

pub fn from_clipboard(registry: &Registry, payload: &ClipboardPayload) -> Pasted {
    if let Some(html) = payload.html.as_deref().filter(|html| !html.trim().is_empty()) {
        match rich::decode(registry, html) {
            Ok(slice) => {
                debug!(tier = "rich", "clipboard tier selected");
                return Pasted::Slice(slice);
            }
            Err(error) => debug!(%error, "rich clipboard tier failed"),
        }
        if html.contains('\0') {
            debug!("html payload contains NUL, skipping html tier");
        } else {
            let doc = parsing::from_markdown_tree(registry, &html::to_markdown_tree(html));
            if !is_blank(&doc) {
                debug!(tier = "html", "clipboard tier selected");
                return Pasted::Slice(Slice::max_open(doc.root().content().clone()));
            }
            debug!("html payload has no content");
        }
    }

    if detect::looks_like_markdown(&payload.plain)
        && let Some(doc) = parsing::parse(registry, &payload.plain)
        && !is_blank(&doc)
    {
        debug!(tier = "markdown", "clipboard tier selected");
        return Pasted::Slice(Slice::max_open(doc.root().content().clone()));
    }

    debug!(tier = "text", "clipboard tier selected");
    Pasted::Text(payload.plain.replace('\0', ""))
}

fn is_blank(doc: &Document) -> bool {
    doc.root()
        .content()
        .iter()
        .all(|node| matches!(node, Node::Element(el) if el.is_textblock() && el.content().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn copy_writes_both_parts() {
        let b = builder();
        let doc = b.doc(vec![
            b.h(1, vec![b.text("Title")]),
            b.p(vec![b.marked("bold", &["bold"]), b.br(), b.text("next")]),
        ]);
        let data = to_clipboard(&b.registry, &doc, Selection::text(1, doc.content().size() - 1));
        assert_eq!(data.plain, "Title\n\nbold\nnext");
        assert!(data.html.contains("<strong>bold</strong>"));
        assert!(data.html.starts_with(&format!("<div {}=", rich::SLICE_ATTR)));
    }

    #[test]
    fn empty_selection_copies_nothing() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("x")])]);
        assert_eq!(to_clipboard(&b.registry, &doc, Selection::cursor(1)), ClipboardData::default());
    }

    #[test]
    fn own_copy_pastes_back_as_the_same_slice() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("one")]), b.p(vec![b.text("two")])]);
        let selection = Selection::text(2, 7);
        let expected = doc.slice(2, 7).unwrap();
        let data = to_clipboard(&b.registry, &doc, selection);
        assert_eq!(from_clipboard(&b.registry, &data.into()), Pasted::Slice(expected));
    }

    #[test]
    fn external_html_is_parsed() {
        let b = builder();
        let payload = ClipboardPayload::plain("ignored").with_html("<p>Hi <em>there</em></p>");
        let Pasted::Slice(slice) = from_clipboard(&b.registry, &payload) else {
            panic!("expected a slice");
        };
        assert_eq!(
            slice.content,
            crate::models::Fragment::from_node(b.p(vec![b.text("Hi "), b.marked("there", &["italic"])]))
        );
        assert_eq!((slice.open_start, slice.open_end), (1, 1));
    }

    #[test]
    fn empty_html_falls_through_to_markdown() {
        let b = builder();
        let payload = ClipboardPayload::plain("# Heading").with_html("<span></span>");
        let Pasted::Slice(slice) = from_clipboard(&b.registry, &payload) else {
            panic!("expected a slice");
        };
        assert_eq!(
            slice.content,
            crate::models::Fragment::from_node(b.h(1, vec![b.text("Heading")]))
        );
    }

    #[test]
    fn prose_is_literal_text() {
        let b = builder();
        let payload = ClipboardPayload::plain("just *some* words");
        assert_eq!(
            from_clipboard(&b.registry, &payload),
            Pasted::Text("just *some* words".to_string())
        );
    }

    #[test]
    fn markdown_with_nul_is_literal_text() {
        let b = builder();
        let payload = ClipboardPayload::plain("# A\0B");
        assert_eq!(from_clipboard(&b.registry, &payload), Pasted::Text("# AB".to_string()));
    }
}
