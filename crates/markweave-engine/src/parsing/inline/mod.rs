//! # Inline Parsing
//!
//! Cursor-based inline parsing with explicit raw zones.
//!
//! ## Architecture
//!
//! Inline parsing runs over the text of every inline-bearing block
//! (paragraphs and headings). It produces markdown tree nodes directly.
//!
//! - Code spans suppress all other inline parsing inside them
//! - Escaped characters become their own nodes so later passes (decorations)
//!   can tell them apart from syntax
//! - Emphasis runs and link brackets are collected while scanning and
//!   resolved afterwards by the delimiter stack
//!
//! ## Modules
//!
//! - **`kinds`**: inline-specific types with owned delimiters
//! - **`cursor`**: `Cursor` for char-by-char scanning
//! - **`delimiters`**: delimiter stack resolution
//! - **`parser`**: `parse_inline()` main entry point
//!
//! ## Raw Zone Precedence
//!
//! Code spans take precedence: `` `[not a link](x)` `` parses as a single
//! code span, not as text containing a link.

pub mod cursor;
pub mod delimiters;
pub mod kinds;
pub mod parser;

pub use parser::parse_inline;
