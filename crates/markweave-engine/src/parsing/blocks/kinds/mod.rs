//! # Block Kinds
//!
//! Block-specific types that own their syntax delimiters. The classifier and
//! builder call into these; they never hardcode `>`, ` ``` ` or `:::`.
//!
//! - **`BlockQuote`**: `>` prefix stripping
//! - **`CodeFence`**: fence signatures, closing rule, fence sizing for output
//! - **`DirectiveFence`**: `:::name{..}` containers, `::name{..}` leaves
//! - **`AtxHeading`**: `#` headings
//! - **`ListMarker`** / **`TaskMarker`**: bullets, ordered markers, `[ ]` / `[x]`
//! - **`ThematicBreak`**: `---` and setext underlines

pub mod block_quote;
pub mod code_fence;
pub mod directive_fence;
pub mod heading;
pub mod list_marker;
pub mod thematic_break;

pub use block_quote::BlockQuote;
pub use code_fence::{CodeFence, FenceSig};
pub use directive_fence::{DirectiveFence, DirectiveLine};
pub use heading::AtxHeading;
pub use list_marker::{ListMarker, TaskMarker};
pub use thematic_break::ThematicBreak;
