use crate::models::{Element, Node, ResolvedPos};

use super::step::Mappable;

/// The editor selection.
///
/// Text selections always sit inside textblocks. Node selections cover one
/// atom and are created through [`Selection::node`], which refuses anything
/// else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { pos: usize },
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Selection::Text { anchor: pos, head: pos }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    /// Select the atom starting at `pos`.
    pub fn node(doc: &Element, pos: usize) -> Option<Self> {
        match doc.resolve(pos).ok()?.node_after()? {
            Node::Element(el) if el.ty().is_atom() => Some(Selection::Node { pos }),
            _ => None,
        }
    }

    pub fn from(&self) -> usize {
        match *self {
            Selection::Text { anchor, head } => anchor.min(head),
            Selection::Node { pos } => pos,
        }
    }

    pub fn to(&self, doc: &Element) -> usize {
        match *self {
            Selection::Text { anchor, head } => anchor.max(head),
            Selection::Node { pos } => pos + node_size_at(doc, pos),
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Selection::Text { head, .. } => head,
            Selection::Node { pos } => pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Text { anchor, head } if anchor == head)
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }

    pub fn at_start(doc: &Element) -> Self {
        match doc.resolve(0) {
            Ok(rp) => Self::near(&rp, 1),
            Err(_) => Self::cursor(0),
        }
    }

    pub fn at_end(doc: &Element) -> Self {
        match doc.resolve(doc.content().size()) {
            Ok(rp) => Self::near(&rp, -1),
            Err(_) => Self::cursor(0),
        }
    }

    /// The closest valid selection to a position: a cursor in the nearest
    /// textblock in the `bias` direction, then the other direction. A
    /// document without textblocks falls back to its nearest atom.
    pub fn near(rp: &ResolvedPos<'_>, bias: i32) -> Self {
        if rp.parent().is_textblock() {
            return Self::cursor(rp.pos());
        }
        let pos = rp.pos();
        let spans = textblock_spans(rp.doc());
        let forward = spans.iter().find(|(start, _)| *start >= pos).map(|(start, _)| *start);
        let backward = spans.iter().rev().find(|(_, end)| *end <= pos).map(|(_, end)| *end);
        let found = if bias < 0 {
            backward.or(forward)
        } else {
            forward.or(backward)
        };
        if let Some(found) = found {
            return Self::cursor(found);
        }

        let atoms = atom_positions(rp.doc());
        let forward = atoms.iter().find(|&&p| p >= pos).copied();
        let backward = atoms.iter().rev().find(|&&p| p < pos).copied();
        let atom = if bias < 0 {
            backward.or(forward)
        } else {
            forward.or(backward)
        };
        atom.map_or(Self::cursor(pos), |pos| Selection::Node { pos })
    }

    /// Carry the selection across edits into `doc`.
    pub fn map(&self, doc: &Element, mapping: &dyn Mappable) -> Self {
        match *self {
            Selection::Text { anchor, head } => {
                Selection::text(mapping.map(anchor, 1), mapping.map(head, 1)).validate(doc)
            }
            Selection::Node { pos } => {
                let mapped = mapping.map_result(pos, 1);
                if !mapped.deleted
                    && let Some(sel) = Selection::node(doc, mapped.pos)
                {
                    return sel;
                }
                Selection::cursor(mapped.pos).validate(doc)
            }
        }
    }

    /// Move each end onto a valid position of `doc`.
    pub fn validate(&self, doc: &Element) -> Self {
        let size = doc.content().size();
        let near = |pos: usize| match doc.resolve(pos.min(size)) {
            Ok(rp) => Self::near(&rp, 1),
            Err(_) => Self::cursor(0),
        };
        match *self {
            Selection::Text { anchor, head } => match (near(anchor), near(head)) {
                (Selection::Text { head: anchor, .. }, Selection::Text { head, .. }) => Selection::text(anchor, head),
                (_, head) => head,
            },
            Selection::Node { pos } => Selection::node(doc, pos).unwrap_or_else(|| near(pos)),
        }
    }

    /// A node selection becomes a cursor just inside the end of the node.
    pub fn to_text(&self, doc: &Element) -> Self {
        match *self {
            Selection::Text { .. } => *self,
            Selection::Node { pos } => {
                let end = (pos + node_size_at(doc, pos)).min(doc.content().size());
                match doc.resolve(end) {
                    Ok(rp) => match Self::near(&rp, -1) {
                        sel @ Selection::Text { .. } => sel,
                        Selection::Node { .. } => *self,
                    },
                    Err(_) => *self,
                }
            }
        }
    }
}

fn node_size_at(doc: &Element, pos: usize) -> usize {
    doc.resolve(pos)
        .ok()
        .and_then(|rp| rp.node_after())
        .map_or(0, |node| node.node_size())
}

/// Content spans of every textblock, in document order.
pub(crate) fn textblock_spans(doc: &Element) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    doc.content().descendants(&mut |node, pos, _, _| match node {
        Node::Element(el) if el.is_textblock() => {
            spans.push((pos + 1, pos + 1 + el.content().size()));
            false
        }
        Node::Element(el) => !el.ty().is_atom(),
        Node::Text(_) => false,
    });
    spans
}

fn atom_positions(doc: &Element) -> Vec<usize> {
    let mut atoms = Vec::new();
    doc.content().descendants(&mut |node, pos, _, _| match node {
        Node::Element(el) if el.ty().is_atom() => {
            atoms.push(pos);
            false
        }
        Node::Element(_) => true,
        Node::Text(_) => false,
    });
    atoms
}

/// A text position as (textblock ordinal, offset into it). Structural
/// rewrites that keep every textblock (wrapping, lifting, retyping) use it
/// to put the selection back where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextPoint {
    ordinal: usize,
    offset: usize,
}

impl TextPoint {
    pub(crate) fn of(doc: &Element, pos: usize) -> Option<Self> {
        textblock_spans(doc)
            .iter()
            .enumerate()
            .find(|(_, (start, end))| *start <= pos && pos <= *end)
            .map(|(ordinal, (start, _))| TextPoint {
                ordinal,
                offset: pos - start,
            })
    }

    pub(crate) fn resolve(&self, doc: &Element) -> Option<usize> {
        let spans = textblock_spans(doc);
        let (start, end) = spans.get(self.ordinal)?;
        Some((start + self.offset).min(*end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::step::StepMap;
    use crate::test_support::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn near_finds_textblocks_in_either_direction() {
        let b = builder();
        // 0 <p> 1 a 2 </p> 3 <hr> 4 <p> 5 b 6 </p> 7
        let doc = b.doc(vec![b.p(vec![b.text("a")]), b.hr(), b.p(vec![b.text("b")])]);
        let rp = doc.resolve(3).unwrap();
        assert_eq!(Selection::near(&rp, 1), Selection::cursor(5));
        assert_eq!(Selection::near(&rp, -1), Selection::cursor(2));
        assert_eq!(Selection::at_end(&doc), Selection::cursor(6));
    }

    #[test]
    fn only_atoms_take_node_selections() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("a")]), b.agent(json!("x"))]);
        assert_eq!(Selection::node(&doc, 3), Some(Selection::Node { pos: 3 }));
        assert_eq!(Selection::node(&doc, 0), None);
    }

    #[test]
    fn atom_only_document_falls_back_to_node_selection() {
        let b = builder();
        let doc = b.doc(vec![b.hr()]);
        assert_eq!(Selection::at_start(&doc), Selection::Node { pos: 0 });
    }

    #[test]
    fn deleted_node_selection_collapses_to_nearest_text() {
        let b = builder();
        // the hr at 3 was removed
        let doc = b.doc(vec![b.p(vec![b.text("a")]), b.p(vec![b.text("b")])]);
        let sel = Selection::Node { pos: 3 }.map(&doc, &StepMap::new(3, 1, 0));
        assert_eq!(sel, Selection::cursor(4));
    }

    #[test]
    fn node_selection_converts_to_cursor_before_its_end() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("ab")]), b.hr(), b.p(Vec::new())]);
        assert_eq!(Selection::Node { pos: 4 }.to_text(&doc), Selection::cursor(3));
    }

    #[test]
    fn text_points_survive_wrapping() {
        let b = builder();
        let flat = b.doc(vec![b.p(vec![b.text("one")]), b.p(vec![b.text("two")])]);
        let wrapped = b.doc(vec![b.bq(vec![b.p(vec![b.text("one")]), b.p(vec![b.text("two")])])]);
        let point = TextPoint::of(&flat, 7).unwrap();
        assert_eq!(point.resolve(&wrapped), Some(8));
    }
}
