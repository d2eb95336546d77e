//! Document conversion and mutation engine for a block-based markdown
//! editor: a composable kind registry, markdown in and out, transactions
//! and commands, the clipboard bridge and the block affordances.

pub mod affordance;
pub mod clipboard;
pub mod editing;
pub mod models;
pub mod parsing;
pub mod persistence;
pub mod registry;
pub mod serializing;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export key types for easier usage
pub use affordance::{Affordance, AffordanceConfig, Effect, MenuItem, Point, Rect, ViewBinding, Viewport};
pub use clipboard::{ClipboardData, ClipboardPayload, Pasted};
pub use editing::{Command, EditorState, Selection, Transaction};
pub use models::{Document, Element, Fragment, Node, Slice};
pub use parsing::parse;
pub use persistence::{DraftsDir, PersistConfig, PersistOutcome, PersistenceQueue, Persister};
pub use registry::{ConfigMap, Extension, ExtensionConfig, Registry, compose};
pub use serializing::serialize;
pub use session::{DocumentChanged, EditorSession};
