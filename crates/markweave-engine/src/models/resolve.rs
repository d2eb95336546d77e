use thiserror::Error;

use super::node::{Element, Mark, Node};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position {pos} out of range (document size {size})")]
    OutOfRange { pos: usize, size: usize },
}

#[derive(Debug, Clone)]
struct Level<'a> {
    node: &'a Element,
    index: usize,
    /// Absolute position of the start of child `index`.
    offset: usize,
}

/// A document position resolved into the path of ancestors that contain it.
///
/// Depth 0 is the document. `node(depth())` is the innermost parent.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<Level<'a>>,
    parent_offset: usize,
}

impl Element {
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, PositionError> {
        let size = self.content().size();
        if pos > size {
            return Err(PositionError::OutOfRange { pos, size });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = self;
        loop {
            let (index, offset) = node.content().find_index(parent_offset, -1);
            let rem = parent_offset - offset;
            path.push(Level {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            match node.child(index) {
                Node::Element(child) => {
                    node = child;
                    parent_offset = rem - 1;
                    start += offset + 1;
                }
                Node::Text(_) => break,
            }
        }
        Ok(ResolvedPos {
            pos,
            path,
            parent_offset,
        })
    }
}

impl<'a> ResolvedPos<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Offset into the innermost parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn doc(&self) -> &'a Element {
        self.path[0].node
    }

    pub fn parent(&self) -> &'a Element {
        self.path[self.depth()].node
    }

    pub fn node(&self, depth: usize) -> &'a Element {
        self.path[depth].node
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let extra = if depth == self.depth() && self.text_offset() == 0 {
            0
        } else {
            1
        };
        self.index(depth) + extra
    }

    /// Position at the start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position directly before the ancestor at `depth` (`depth >= 1`).
    pub fn before(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position directly after the ancestor at `depth` (`depth >= 1`).
    pub fn after(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.node(depth).node_size()
        }
    }

    /// Distance into a text run when the position falls inside one.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if index == parent.child_count() {
            return None;
        }
        let off = self.text_offset();
        let child = parent.child(index);
        Some(if off > 0 {
            child.cut(off, child.node_size())
        } else {
            child.clone()
        })
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let off = self.text_offset();
        if off > 0 {
            return Some(parent.child(index).cut(0, off));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Deepest depth whose node also contains `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    /// Marks a character typed at this position would get.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content().size() == 0 {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }
        let before = index.checked_sub(1).and_then(|i| parent.content().maybe_child(i));
        let main = before.or_else(|| parent.content().maybe_child(index));
        main.map(|n| n.marks().to_vec()).unwrap_or_default()
    }

    /// The range of sibling blocks spanning this position and `other`,
    /// optionally restricted to parents matching `pred`.
    pub fn block_range(
        &self,
        other: &ResolvedPos<'a>,
        pred: Option<&dyn Fn(&Element) -> bool>,
    ) -> Option<BlockRange<'a>> {
        if other.pos < self.pos {
            return other.block_range(self, pred);
        }
        let skip = usize::from(self.parent().ty().spec().inline_content || self.pos == other.pos);
        let top = self.depth().checked_sub(skip)?;
        (0..=top).rev().find_map(|d| {
            let fits = other.pos <= self.end(d) && pred.is_none_or(|p| p(self.node(d)));
            fits.then(|| BlockRange {
                from: self.clone(),
                to: other.clone(),
                depth: d,
            })
        })
    }

    /// Index path from the root, used to compare positions structurally.
    pub fn indices(&self) -> Vec<usize> {
        self.path.iter().map(|l| l.index).collect()
    }
}

/// A flat range of siblings inside the node at `depth`.
#[derive(Debug, Clone)]
pub struct BlockRange<'a> {
    pub from: ResolvedPos<'a>,
    pub to: ResolvedPos<'a>,
    pub depth: usize,
}

impl<'a> BlockRange<'a> {
    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn parent(&self) -> &'a Element {
        self.from.node(self.depth)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}
