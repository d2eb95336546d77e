//! # Block Parsing
//!
//! Two-phase block parsing.
//!
//! ## Parsing Phases
//!
//! 1. **Line Classification** (`classify`): each line is classified into a
//!    `LineClass` holding local facts (indentation, blank status, and which
//!    construct it could open)
//!
//! 2. **Block Construction** (`builder`): a `BlockBuilder` walks the classified
//!    lines, collecting container contents and recursing into them
//!
//! ## Modules
//!
//! - **`kinds`**: block-specific types with owned delimiters
//! - **`classify`**: `classify` produces a `LineClass` for each line
//! - **`builder`**: `BlockBuilder` builds the markdown tree
//!
//! ## Key Invariants
//!
//! - Nesting depth is unbounded (lists in blockquotes in lists, etc.)
//! - Fenced code and raw containers are raw zones: no block or inline parsing inside
//! - Every input yields a tree; unrecognized lines are paragraph text

pub mod builder;
pub mod classify;
pub mod kinds;

pub use builder::BlockBuilder;
pub use classify::{LineClass, Opener, classify};
