//! # Inline Kinds
//!
//! Inline-specific types that own their syntax delimiters.
//!
//! ## Types
//!
//! - **`CodeSpan`**: `` ` `` runs; raw zone that suppresses other parsing
//! - **`Emphasis`**: `*`, `_` and `~~` delimiter runs with flanking rules
//! - **`Link`**: `[text](dest "title")` targets and `<scheme:...>` autolinks
//!
//! ## Design Principle
//!
//! All delimiter constants live here, not scattered in parser code.

pub mod code_span;
pub mod emphasis;
pub mod link;

pub use code_span::CodeSpan;
pub use emphasis::Emphasis;
pub use link::{Link, LinkTarget};
