use std::fmt;

use super::fragment::Fragment;
use super::node::{Element, Node};
use super::resolve::PositionError;

/// A piece of a document: a fragment plus how many ancestor levels are left
/// open on each side.
///
/// `open_start == 1` on a slice holding a paragraph means the paragraph's
/// start is cut away, so inserting the slice merges its text into the
/// textblock at the insertion point.
#[derive(Clone, PartialEq, Default)]
pub struct Slice {
    pub content: Fragment,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A closed slice, e.g. a node inserted whole.
    pub fn closed(content: Fragment) -> Self {
        Self::new(content, 0, 0)
    }

    /// Net positions the slice adds when inserted.
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    /// Open as deep as the first and last children allow.
    pub fn max_open(content: Fragment) -> Self {
        let mut open_start = 0;
        let mut node = content.first_child();
        while let Some(Node::Element(el)) = node {
            if el.ty().is_leaf() || el.ty().is_atom() {
                break;
            }
            open_start += 1;
            node = el.content().first_child();
        }
        let mut open_end = 0;
        let mut node = content.last_child();
        while let Some(Node::Element(el)) = node {
            if el.ty().is_leaf() || el.ty().is_atom() {
                break;
            }
            open_end += 1;
            node = el.content().last_child();
        }
        Self::new(content, open_start, open_end)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({},{})", self.content, self.open_start, self.open_end)
    }
}

impl Element {
    /// The content between two positions, opened to their shared ancestor.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, PositionError> {
        if from >= to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom.node(depth).content().cut(from - start, to - start);
        Ok(Slice::new(content, rfrom.depth() - depth, rto.depth() - depth))
    }
}
