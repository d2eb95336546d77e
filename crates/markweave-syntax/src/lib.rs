//! # markweave-syntax
//!
//! Token-level lexers for the two grammars the markweave engine reads that are
//! *not* markdown itself, both built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Where These Grammars Show Up
//!
//! ```text
//! ::metric{metric={"id":"42"}}        <p>Hello <strong>world</strong></p>
//!         └──────┬───────────┘        └───────────────┬────────────────┘
//!          directive attributes               HTML fragment (clipboard)
//!             [`directive`]                        [`html`]
//! ```
//!
//! ### 1. Directive attributes ([`directive`] module)
//!
//! Custom embeds are written as directives: `::name{...}` for leaf and inline
//! forms, `:::name{...}` for containers. The brace-delimited attribute list is
//! lexed here. Values may be bare words, quoted strings, or raw JSON objects
//! and arrays, which is how structured attributes travel:
//!
//! ```
//! use markweave_syntax::directive::parse_attributes;
//!
//! let (attrs, consumed) = parse_attributes(r#"{metric={"id":"42"} size=2}"#).unwrap();
//! assert_eq!(consumed, 27);
//! assert_eq!(attrs[0].key, "metric");
//! assert_eq!(attrs[0].value, r#"{"id":"42"}"#);
//! assert_eq!(attrs[1].value, "2");
//! ```
//!
//! ### 2. HTML fragments ([`html`] module)
//!
//! Rich clipboard payloads arrive as HTML. The engine never needs a full DOM,
//! only a tolerant stream of start tags, end tags and text, so this lexer
//! produces exactly that and leaves tree building to the caller:
//!
//! ```
//! use markweave_syntax::html::{events, HtmlEvent};
//!
//! let evs = events("<p class=\"x\">Hi</p>");
//! assert!(matches!(&evs[0], HtmlEvent::Start(tag) if tag.name == "p"));
//! assert_eq!(evs[1], HtmlEvent::Text("Hi"));
//! assert_eq!(evs[2], HtmlEvent::End("p".to_string()));
//! ```
//!
//! ## Error Tolerance
//!
//! Neither lexer panics on malformed input. Unknown characters in an HTML
//! stream degrade to text; a malformed attribute list reports `None` so the
//! caller can treat the directive as plain text.

pub mod directive;
pub mod html;

pub use directive::{DirectiveAttr, parse_attributes, write_attributes};
pub use html::{HtmlEvent, Tag, events};
