use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::fragment::Fragment;
use super::node::Element;

/// An immutable document tree. Cloning shares the root.
///
/// Every version after the first comes from applying a transaction; an
/// unchanged document keeps pointer identity, which is how callers tell a
/// rejected command from an accepted one.
#[derive(Clone, PartialEq)]
pub struct Document(Arc<Element>);

impl Document {
    pub fn new(root: Element) -> Self {
        Self(Arc::new(root))
    }

    pub fn root(&self) -> &Element {
        &self.0
    }

    /// Size of the addressable content: positions run from 0 to `size()`.
    pub fn size(&self) -> usize {
        self.0.content().size()
    }

    pub fn ptr_eq(a: &Document, b: &Document) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// A copy of the root with new top-level content.
    pub fn with_content(&self, content: Fragment) -> Document {
        Document::new(self.0.copy(content))
    }
}

impl Deref for Document {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.0
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
