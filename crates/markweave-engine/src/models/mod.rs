pub mod content;
pub mod document;
pub mod fragment;
pub mod node;
pub mod replace;
pub mod resolve;
pub mod schema;
pub mod slice;

pub use content::{ContentExpr, ContentExprError, ContentItem, Filled};
pub use document::Document;
pub use fragment::Fragment;
pub use node::{Element, Mark, Node, TextRun};
pub use replace::ReplaceError;
pub use resolve::{BlockRange, PositionError, ResolvedPos};
pub use schema::{AttrError, AttrSpec, AttrValue, Attrs, Group, MarkSpec, MarkType, NodeSpec, NodeType, Role};
pub use slice::Slice;
