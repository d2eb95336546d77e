//! Structural replace: swap the range between two resolved positions for a
//! slice, joining the open sides of the slice onto the surrounding nodes.
//!
//! The algorithm rebuilds only the spine from the root down to the changed
//! range. At each depth the content is assembled from three parts:
//!
//! ```text
//!   [ left of $from ] [ slice content ] [ right of $to ]
//! ```
//!
//! Open slice edges are merged into the node they land in, which is only
//! allowed when the two kinds share content rules.

use thiserror::Error;

use super::fragment::Fragment;
use super::node::{Element, Node};
use super::resolve::{PositionError, ResolvedPos};
use super::slice::Slice;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    #[error("inserted content deeper than insertion position")]
    TooDeep,

    #[error("inconsistent open depths")]
    InconsistentDepths,

    #[error("cannot join {sub} onto {main}")]
    CannotJoin { sub: String, main: String },

    #[error("invalid content for node {0}")]
    InvalidContent(String),

    #[error(transparent)]
    Position(#[from] PositionError),
}

impl Element {
    /// Replace `[from, to)` with `slice`, returning the new root.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Element, ReplaceError> {
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        replace(&rfrom, &rto, slice)
    }
}

pub fn replace(rfrom: &ResolvedPos<'_>, rto: &ResolvedPos<'_>, slice: &Slice) -> Result<Element, ReplaceError> {
    if slice.open_start > rfrom.depth() {
        return Err(ReplaceError::TooDeep);
    }
    if slice.open_end > rto.depth() || rfrom.depth() - slice.open_start != rto.depth() - slice.open_end {
        return Err(ReplaceError::InconsistentDepths);
    }
    replace_outer(rfrom, rto, slice, 0)
}

fn replace_outer(
    rfrom: &ResolvedPos<'_>,
    rto: &ResolvedPos<'_>,
    slice: &Slice,
    depth: usize,
) -> Result<Element, ReplaceError> {
    let index = rfrom.index(depth);
    let node = rfrom.node(depth);
    if index == rto.index(depth) && depth < rfrom.depth() - slice.open_start {
        let inner = replace_outer(rfrom, rto, slice, depth + 1)?;
        Ok(node.copy(node.content().replace_child(index, inner.into_node())))
    } else if slice.content.size() == 0 {
        close(node, replace_two_way(rfrom, rto, depth)?)
    } else if slice.open_start == 0
        && slice.open_end == 0
        && rfrom.depth() == depth
        && rto.depth() == depth
    {
        let parent = rfrom.parent();
        let content = parent.content();
        let joined = content
            .cut(0, rfrom.parent_offset())
            .append(&slice.content)
            .append(&content.cut(rto.parent_offset(), content.size()));
        close(parent, joined)
    } else {
        let (scratch, extra) = prepare_slice_for_replace(slice, rfrom);
        let start = scratch.resolve(slice.open_start + extra)?;
        let end_pos = scratch
            .content()
            .size()
            .saturating_sub(slice.open_end + extra);
        let end = scratch.resolve(end_pos)?;
        close(node, replace_three_way(rfrom, &start, &end, rto, depth)?)
    }
}

fn check_join(main: &Element, sub: &Element) -> Result<(), ReplaceError> {
    if sub.ty().compatible_content(main.ty()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            sub: sub.kind_name().to_string(),
            main: main.kind_name().to_string(),
        })
    }
}

fn joinable<'a>(
    before: &ResolvedPos<'a>,
    after: &ResolvedPos<'_>,
    depth: usize,
) -> Result<&'a Element, ReplaceError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node)
}

fn add_range(start: Option<&ResolvedPos<'_>>, end: Option<&ResolvedPos<'_>>, depth: usize, target: &mut Vec<Node>) {
    let Some(node) = end.or(start).map(|r| r.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            target.extend(start.node_after());
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        target.push(node.child(i).clone());
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
    {
        target.extend(end.node_before());
    }
}

fn close(node: &Element, content: Fragment) -> Result<Element, ReplaceError> {
    if !node.ty().valid_content(&content) {
        return Err(ReplaceError::InvalidContent(node.kind_name().to_string()));
    }
    Ok(node.copy(content))
}

fn replace_three_way(
    rfrom: &ResolvedPos<'_>,
    start: &ResolvedPos<'_>,
    end: &ResolvedPos<'_>,
    rto: &ResolvedPos<'_>,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let open_start = if rfrom.depth() > depth {
        Some(joinable(rfrom, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if rto.depth() > depth {
        Some(joinable(end, rto, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(rfrom), depth, &mut content);
    match (open_start, open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            let inner = replace_three_way(rfrom, start, end, rto, depth + 1)?;
            content.push(close(os, inner)?.into_node());
        }
        _ => {
            if let Some(os) = open_start {
                let inner = replace_two_way(rfrom, start, depth + 1)?;
                content.push(close(os, inner)?.into_node());
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = open_end {
                let inner = replace_two_way(end, rto, depth + 1)?;
                content.push(close(oe, inner)?.into_node());
            }
        }
    }
    add_range(Some(rto), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

fn replace_two_way(rfrom: &ResolvedPos<'_>, rto: &ResolvedPos<'_>, depth: usize) -> Result<Fragment, ReplaceError> {
    let mut content = Vec::new();
    add_range(None, Some(rfrom), depth, &mut content);
    if rfrom.depth() > depth {
        let ty = joinable(rfrom, rto, depth + 1)?;
        let inner = replace_two_way(rfrom, rto, depth + 1)?;
        content.push(close(ty, inner)?.into_node());
    }
    add_range(Some(rto), None, depth, &mut content);
    Ok(Fragment::from_vec(content))
}

/// Wrap the slice content in copies of the ancestors of `along` so it can be
/// resolved like a document of the same shape.
fn prepare_slice_for_replace(slice: &Slice, along: &ResolvedPos<'_>) -> (Element, usize) {
    let extra = along.depth() - slice.open_start;
    let parent = along.node(extra);
    let mut node = parent.copy(slice.content.clone());
    for i in (0..extra).rev() {
        node = along.node(i).copy(Fragment::from_node(node.into_node()));
    }
    (node, extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_text_insert() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("held")])]);
        let slice = Slice::closed(Fragment::from_node(b.text("lo worl")));
        let out = doc.replace(4, 4, &slice).unwrap();
        assert_eq!(out.text_content(), "hello world");
    }

    #[test]
    fn delete_across_paragraphs_joins_them() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("hello")]), b.p(vec![b.text("world")])]);
        let out = doc.replace(3, 10, &Slice::empty()).unwrap();
        assert_eq!(out.child_count(), 1);
        assert_eq!(out.text_content(), "herld");
    }

    #[test]
    fn open_slice_merges_into_textblocks() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("ab")])]);
        let source = b.doc(vec![b.p(vec![b.text("one")]), b.p(vec![b.text("two")])]);
        let slice = source.slice(2, 8).unwrap();
        let out = doc.replace(2, 2, &slice).unwrap();
        assert_eq!(out.child_count(), 2);
        assert_eq!(out.child(0).text_content(), "ane");
        assert_eq!(out.child(1).text_content(), "twb");
    }

    #[test]
    fn joining_incompatible_kinds_fails() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("ab")]), b.code_block(vec![b.text("cd")])]);
        assert!(matches!(
            doc.replace(2, 6, &Slice::empty()),
            Err(ReplaceError::CannotJoin { .. })
        ));
    }

    #[test]
    fn invalid_content_is_rejected() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("ab")])]);
        let slice = Slice::closed(Fragment::from_node(b.text("x")));
        // text directly in the doc
        assert!(matches!(
            doc.replace(0, 0, &slice),
            Err(ReplaceError::InvalidContent(kind)) if kind == "doc"
        ));
    }

    #[test]
    fn marks_are_rejected_in_code_blocks() {
        let b = builder();
        let doc = b.doc(vec![b.code_block(vec![b.text("x")])]);
        let slice = Slice::closed(Fragment::from_node(b.marked("y", &["bold"])));
        assert!(doc.replace(1, 1, &slice).is_err());
    }
}
