use thiserror::Error;

use crate::models::{AttrError, Attrs, Element, Fragment, Node, PositionError, ReplaceError, Slice};

use super::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Replace(#[from] ReplaceError),

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("no node starts at position {0}")]
    NoNode(usize),
}

/// Where a position ended up, and whether the content around it was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    pub deleted: bool,
}

impl MapResult {
    fn kept(pos: usize) -> Self {
        Self { pos, deleted: false }
    }
}

/// Anything positions can be carried through.
pub trait Mappable {
    /// `assoc < 0` keeps a position on the left of inserted or replaced
    /// content, `assoc > 0` moves it to the right.
    fn map_result(&self, pos: usize, assoc: i32) -> MapResult;

    fn map(&self, pos: usize, assoc: i32) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// The position change made by one step: `old_size` positions starting at
/// `start` became `new_size` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepMap {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            start,
            old_size,
            new_size,
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.old_size == 0 && self.new_size == 0
    }
}

impl Mappable for StepMap {
    fn map_result(&self, pos: usize, assoc: i32) -> MapResult {
        let end = self.start + self.old_size;
        if self.is_identity() || pos < self.start {
            return MapResult::kept(pos);
        }
        if pos > end {
            return MapResult::kept(pos - self.old_size + self.new_size);
        }
        // Rewriting content in place (marks, block type) keeps positions.
        if self.old_size == self.new_size {
            return MapResult::kept(pos);
        }
        let side = if self.old_size == 0 {
            assoc
        } else if pos == self.start {
            -1
        } else if pos == end {
            1
        } else {
            assoc
        };
        let mapped = if side < 0 {
            self.start
        } else {
            self.start + self.new_size
        };
        MapResult {
            pos: mapped,
            deleted: pos != self.start && pos != end,
        }
    }
}

/// The maps of a sequence of steps, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }
}

impl Mappable for Mapping {
    fn map_result(&self, pos: usize, assoc: i32) -> MapResult {
        self.maps.iter().fold(MapResult::kept(pos), |acc, map| {
            let next = map.map_result(acc.pos, assoc);
            MapResult {
                pos: next.pos,
                deleted: acc.deleted || next.deleted,
            }
        })
    }
}

/// A primitive edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Replace { from: usize, to: usize, slice: Slice },
    /// Merge attributes into the node starting at `pos`.
    SetAttrs { pos: usize, attrs: Attrs },
    SetSelection(Selection),
}

impl Step {
    pub fn apply(&self, doc: &Element) -> Result<Element, StepError> {
        match self {
            Step::Replace { from, to, slice } => Ok(doc.replace(*from, *to, slice)?),
            Step::SetAttrs { pos, attrs } => {
                let target = match doc.resolve(*pos)?.node_after() {
                    Some(Node::Element(el)) => el,
                    _ => return Err(StepError::NoNode(*pos)),
                };
                let mut merged = target.attrs().clone();
                merged.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
                let merged = target.ty().compute_attrs(Some(&merged))?;
                let updated = target.with_attrs(merged).into_node();
                let end = pos + target.node_size();
                Ok(doc.replace(*pos, end, &Slice::closed(Fragment::from_node(updated)))?)
            }
            Step::SetSelection(_) => Ok(doc.clone()),
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, slice } => StepMap::new(*from, to.saturating_sub(*from), slice.size()),
            Step::SetAttrs { .. } | Step::SetSelection(_) => StepMap::identity(),
        }
    }

    pub fn changes_doc(&self) -> bool {
        !matches!(self, Step::SetSelection(_))
    }
}
