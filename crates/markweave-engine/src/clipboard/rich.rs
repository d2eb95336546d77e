//! The internal rich encoding: a slice as JSON, carried in a `data-` attribute
//! of the HTML clipboard part.
//!
//! ```text
//! <div data-markweave-slice="{&quot;openStart&quot;:1,...}"> rendered html </div>
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use markweave_syntax::html::{HtmlEvent, events};

use crate::models::{AttrError, Attrs, Element, Fragment, Mark, Node, Slice, TextRun};
use crate::registry::Registry;

/// Attribute carrying the encoded slice.
pub const SLICE_ATTR: &str = "data-markweave-slice";

#[derive(Debug, Error)]
pub enum SliceDecodeError {
    #[error("no {SLICE_ATTR} attribute in payload")]
    Missing,

    #[error("malformed slice json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown kind {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("slice is not valid: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SliceJson {
    #[serde(default)]
    open_start: usize,
    #[serde(default)]
    open_end: usize,
    content: Vec<NodeJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeJson {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<NodeJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<MarkJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkJson {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
}

pub fn encode(slice: &Slice) -> String {
    let json = SliceJson {
        open_start: slice.open_start,
        open_end: slice.open_end,
        content: slice.content.iter().map(node_json).collect(),
    };
    // Plain data only; serializing it cannot fail
    serde_json::to_string(&json).unwrap_or_default()
}

fn node_json(node: &Node) -> NodeJson {
    match node {
        Node::Text(run) => NodeJson {
            kind: "text".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(run.text().to_string()),
            marks: run
                .marks()
                .iter()
                .map(|mark| MarkJson {
                    kind: mark.kind_name().to_string(),
                    attrs: mark.attrs().clone(),
                })
                .collect(),
        },
        Node::Element(el) => NodeJson {
            kind: el.kind_name().to_string(),
            attrs: el.attrs().clone(),
            content: el.content().iter().map(node_json).collect(),
            text: None,
            marks: Vec::new(),
        },
    }
}

/// The wrapper element around the rendered HTML.
pub fn wrap(slice: &Slice, html: &str) -> String {
    let json = encode(slice);
    format!(
        "<div {SLICE_ATTR}=\"{}\">{html}</div>",
        html_escape::encode_double_quoted_attribute(&json)
    )
}

/// Find and decode the slice carried by an HTML payload.
pub fn decode(registry: &Registry, html: &str) -> Result<Slice, SliceDecodeError> {
    let raw = events(html)
        .into_iter()
        .find_map(|event| match event {
            HtmlEvent::Start(tag) => tag.attr(SLICE_ATTR).map(str::to_string),
            _ => None,
        })
        .ok_or(SliceDecodeError::Missing)?;
    let json: SliceJson = serde_json::from_str(&html_escape::decode_html_entities(&raw))?;
    let content = json
        .content
        .iter()
        .map(|node| build(registry, node))
        .collect::<Result<Vec<_>, _>>()?;
    let slice = Slice::new(Fragment::from_vec(content), json.open_start, json.open_end);
    check(&slice)?;
    Ok(slice)
}

fn build(registry: &Registry, json: &NodeJson) -> Result<Node, SliceDecodeError> {
    if json.kind == "text" {
        let marks = json
            .marks
            .iter()
            .map(|mark| {
                let ty = registry
                    .mark_type(&mark.kind)
                    .ok_or_else(|| SliceDecodeError::UnknownKind(mark.kind.clone()))?;
                Ok(Mark::new(ty.clone(), ty.compute_attrs(Some(&mark.attrs))?))
            })
            .collect::<Result<Vec<_>, SliceDecodeError>>()?;
        let text = json.text.as_deref().unwrap_or_default();
        return Ok(Node::Text(TextRun::new(text, marks)));
    }
    let ty = registry
        .node_type(&json.kind)
        .ok_or_else(|| SliceDecodeError::UnknownKind(json.kind.clone()))?;
    let attrs = ty.compute_attrs(Some(&json.attrs))?;
    let content = json
        .content
        .iter()
        .map(|child| build(registry, child))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Element::new(ty.clone(), attrs, Fragment::from_vec(content)).into_node())
}

/// Open sides must reach as deep as they claim, and every node closed on
/// both sides must hold valid content.
fn check(slice: &Slice) -> Result<(), SliceDecodeError> {
    if slice.content.is_empty() {
        return Err(SliceDecodeError::Invalid("empty slice"));
    }
    if open_depth(slice.content.first_child(), |f| f.first_child()) < slice.open_start
        || open_depth(slice.content.last_child(), |f| f.last_child()) < slice.open_end
    {
        return Err(SliceDecodeError::Invalid("open depth exceeds content"));
    }
    let last = slice.content.child_count() - 1;
    for (i, child) in slice.content.iter().enumerate() {
        let open_start = if i == 0 { slice.open_start } else { 0 };
        let open_end = if i == last { slice.open_end } else { 0 };
        if !closed_nodes_valid(child, open_start, open_end) {
            return Err(SliceDecodeError::Invalid("node content violates its kind"));
        }
    }
    Ok(())
}

fn open_depth(mut node: Option<&Node>, next: impl Fn(&Fragment) -> Option<&Node>) -> usize {
    let mut depth = 0;
    while let Some(Node::Element(el)) = node {
        if el.ty().is_atom() {
            break;
        }
        depth += 1;
        node = next(el.content());
    }
    depth
}

fn closed_nodes_valid(node: &Node, open_start: usize, open_end: usize) -> bool {
    let Node::Element(el) = node else {
        return true;
    };
    if open_start == 0 && open_end == 0 && !el.ty().valid_content(el.content()) {
        return false;
    }
    let count = el.child_count();
    el.content().iter().enumerate().all(|(i, child)| {
        let start = if i == 0 { open_start.saturating_sub(1) } else { 0 };
        let end = if i + 1 == count { open_end.saturating_sub(1) } else { 0 };
        closed_nodes_valid(child, start, end)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn open_slice_survives_the_html_wrapper() {
        let b = builder();
        let slice = Slice::new(
            Fragment::from_vec(vec![
                b.p(vec![b.marked("end of one", &["bold"])]),
                b.p(vec![b.text("start of "), b.metric(json!({"id": "42"}))]),
            ]),
            1,
            1,
        );
        let html = wrap(&slice, "<p>ignored</p>");
        assert!(html.contains("&quot;"));
        assert_eq!(decode(&b.registry, &html).unwrap(), slice);
    }

    #[test]
    fn unknown_kinds_fail_decoding() {
        let b = builder();
        let json = r#"{"openStart":0,"openEnd":0,"content":[{"type":"sparkle"}]}"#;
        let html = format!("<div {SLICE_ATTR}='{json}'></div>");
        assert!(matches!(
            decode(&b.registry, &html),
            Err(SliceDecodeError::UnknownKind(kind)) if kind == "sparkle"
        ));
    }

    #[test]
    fn overclaimed_open_depth_is_rejected() {
        let b = builder();
        let slice = Slice::new(Fragment::from_node(b.hr()), 1, 0);
        let html = wrap(&slice, "");
        assert!(matches!(decode(&b.registry, &html), Err(SliceDecodeError::Invalid(_))));
    }

    #[test]
    fn closed_nodes_must_be_valid() {
        let b = builder();
        let json = r#"{"content":[{"type":"bulletList"}]}"#;
        let html = format!("<div {SLICE_ATTR}='{json}'></div>");
        assert!(matches!(decode(&b.registry, &html), Err(SliceDecodeError::Invalid(_))));
    }

    #[test]
    fn html_without_the_attribute_is_missing() {
        let b = builder();
        assert!(matches!(
            decode(&b.registry, "<p>hello</p>"),
            Err(SliceDecodeError::Missing)
        ));
    }
}
