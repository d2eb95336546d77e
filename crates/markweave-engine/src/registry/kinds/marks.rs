//! Inline marks, in rank order: `bold` is outermost, `code` innermost.

use serde_json::{Value, json};

use crate::models::{Attrs, Mark};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::processor::{Processor, Shape};
use crate::registry::descriptor::{KindDescriptor, SyntaxHooks};
use crate::registry::{Extension, Options};

use super::{MarkRule, MarkWriter, attr_str};

pub struct BoldExt;
pub struct ItalicExt;
pub struct StrikeExt;
pub struct UnderlineExt;
pub struct LinkExt;
pub struct HighlightExt;
pub struct SubscriptExt;
pub struct SuperscriptExt;
pub struct CodeExt;

impl Extension for BoldExt {
    fn name(&self) -> &'static str {
        "bold"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("bold")
                .parser(MarkRule::new(|n| n.kind == MdKind::Strong))
                .serializer(MarkWriter(|_| MdKind::Strong)),
        ]
    }
}

impl Extension for ItalicExt {
    fn name(&self) -> &'static str {
        "italic"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("italic")
                .parser(MarkRule::new(|n| n.kind == MdKind::Emphasis))
                .serializer(MarkWriter(|_| MdKind::Emphasis)),
        ]
    }
}

impl Extension for StrikeExt {
    fn name(&self) -> &'static str {
        "strike"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("strike")
                .parser(MarkRule::new(|n| n.kind == MdKind::Delete))
                .serializer(MarkWriter(|_| MdKind::Delete)),
        ]
    }
}

fn is_decoration(node: &MdNode, expected: &str) -> bool {
    matches!(&node.kind, MdKind::Decoration { name, .. } if name == expected)
}

fn decoration(name: &str) -> MdKind {
    MdKind::Decoration {
        name: name.to_string(),
        flags: String::new(),
    }
}

/// Registers a decoration before any kind finishes initializing.
struct DecorationSyntax {
    name: &'static str,
    marker: char,
    shape: Shape,
}

impl SyntaxHooks for DecorationSyntax {
    fn before_init(&self, processor: &mut Processor) {
        processor.decoration(self.name, self.marker, self.shape);
    }
}

impl Extension for UnderlineExt {
    fn name(&self) -> &'static str {
        "underline"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("underline")
                .parser(MarkRule::new(|n| is_decoration(n, "underline")))
                .serializer(MarkWriter(|_| decoration("underline")))
                .hooks(DecorationSyntax {
                    name: "underline",
                    marker: '+',
                    shape: Shape::Double { flags: false },
                }),
        ]
    }
}

impl Extension for LinkExt {
    fn name(&self) -> &'static str {
        "link"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("link")
                .attr("href", json!(""))
                .attr("title", Value::Null)
                .parser(MarkRule::new(|n| matches!(n.kind, MdKind::Link { .. })).with_attrs(|n| {
                    match &n.kind {
                        MdKind::Link { url, title } => Attrs::from([
                            ("href".to_string(), json!(url)),
                            ("title".to_string(), title.as_ref().map_or(Value::Null, |t| json!(t))),
                        ]),
                        _ => Attrs::new(),
                    }
                }))
                .serializer(MarkWriter(|mark| MdKind::Link {
                    url: attr_str(mark.attrs(), "href").unwrap_or_default().to_string(),
                    title: attr_str(mark.attrs(), "title").map(str::to_string),
                })),
        ]
    }
}

/// Highlight colours and their one-letter flag codes. `b` never appears as
/// a code: it prefixes background colours (`=br=` is `b-red`).
pub const HIGHLIGHT_COLOURS: [(char, &str); 25] = [
    ('a', "gray"),
    ('t', "tomato"),
    ('r', "red"),
    ('u', "ruby"),
    ('c', "crimson"),
    ('k', "pink"),
    ('m', "plum"),
    ('p', "purple"),
    ('v', "violet"),
    ('i', "iris"),
    ('n', "indigo"),
    ('e', "blue"),
    ('q', "cyan"),
    ('l', "teal"),
    ('j', "jade"),
    ('g', "green"),
    ('z', "bronze"),
    ('d', "gold"),
    ('w', "brown"),
    ('o', "orange"),
    ('x', "amber"),
    ('y', "yellow"),
    ('h', "lime"),
    ('s', "mint"),
    ('f', "sky"),
];

const BACKGROUND: char = 'b';
const BACKGROUND_PREFIX: &str = "b-";

/// Colour name for a flag such as `r` or `br`.
pub fn colour_for_flags(flags: &str) -> Option<String> {
    let mut chars = flags.chars();
    let (background, code) = match (chars.next(), chars.next(), chars.next()) {
        (Some(BACKGROUND), Some(code), None) => (true, code),
        (Some(code), None, None) => (false, code),
        _ => return None,
    };
    let (_, name) = HIGHLIGHT_COLOURS.iter().find(|(c, _)| *c == code)?;
    Some(if background {
        format!("{BACKGROUND_PREFIX}{name}")
    } else {
        name.to_string()
    })
}

/// Flag for a colour name; empty for unknown colours.
pub fn flags_for_colour(colour: &str) -> String {
    let (background, name) = match colour.strip_prefix(BACKGROUND_PREFIX) {
        Some(name) => (true, name),
        None => (false, colour),
    };
    let Some((code, _)) = HIGHLIGHT_COLOURS.iter().find(|(_, n)| *n == name) else {
        return String::new();
    };
    if background {
        format!("{BACKGROUND}{code}")
    } else {
        code.to_string()
    }
}

impl Extension for HighlightExt {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn default_options(&self) -> Options {
        let mut options = Options::new();
        options.insert("multicolor".into(), json!(true));
        options
    }

    fn descriptors(&self, options: &Options) -> Vec<KindDescriptor> {
        let multicolor = options
            .get("multicolor")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let rule = if multicolor {
            MarkRule::new(|n| is_decoration(n, "highlight")).with_attrs(|n| match &n.kind {
                MdKind::Decoration { flags, .. } => Attrs::from([(
                    "color".to_string(),
                    colour_for_flags(flags).map_or(Value::Null, Value::String),
                )]),
                _ => Attrs::new(),
            })
        } else {
            MarkRule::new(|n| is_decoration(n, "highlight"))
        };
        let writer = if multicolor {
            MarkWriter(|mark: &Mark| MdKind::Decoration {
                name: "highlight".to_string(),
                flags: attr_str(mark.attrs(), "color").map(flags_for_colour).unwrap_or_default(),
            })
        } else {
            MarkWriter(|_: &Mark| decoration("highlight"))
        };
        vec![
            KindDescriptor::mark("highlight")
                .attr("color", Value::Null)
                .parser(rule)
                .serializer(writer)
                .hooks(DecorationSyntax {
                    name: "highlight",
                    marker: '=',
                    shape: Shape::Double { flags: true },
                }),
        ]
    }
}

impl Extension for SubscriptExt {
    fn name(&self) -> &'static str {
        "subscript"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("subscript")
                .parser(MarkRule::new(|n| is_decoration(n, "subscript")))
                .serializer(MarkWriter(|_| decoration("subscript")))
                .hooks(DecorationSyntax {
                    name: "subscript",
                    marker: '~',
                    shape: Shape::Single,
                }),
        ]
    }
}

impl Extension for SuperscriptExt {
    fn name(&self) -> &'static str {
        "superscript"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("superscript")
                .parser(MarkRule::new(|n| is_decoration(n, "superscript")))
                .serializer(MarkWriter(|_| decoration("superscript")))
                .hooks(DecorationSyntax {
                    name: "superscript",
                    marker: '^',
                    shape: Shape::Single,
                }),
        ]
    }
}

impl Extension for CodeExt {
    fn name(&self) -> &'static str {
        "code"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::mark("code")
                .parser(MarkRule::new(|n| n.kind == MdKind::InlineCode))
                .serializer(MarkWriter(|_| MdKind::InlineCode)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("r", Some("red"))]
    #[case("br", Some("b-red"))]
    #[case("a", Some("gray"))]
    #[case("bf", Some("b-sky"))]
    #[case("", None)]
    #[case("b", None)]
    #[case("rr", None)]
    fn flags_to_colour(#[case] flags: &str, #[case] expected: Option<&str>) {
        assert_eq!(colour_for_flags(flags).as_deref(), expected);
    }

    #[test]
    fn colour_codes_are_unique_and_never_b() {
        let codes: HashSet<char> = HIGHLIGHT_COLOURS.iter().map(|(c, _)| *c).collect();
        assert_eq!(codes.len(), HIGHLIGHT_COLOURS.len());
        assert!(!codes.contains(&BACKGROUND));
    }

    #[test]
    fn every_colour_round_trips_through_flags() {
        for (_, name) in HIGHLIGHT_COLOURS {
            assert_eq!(colour_for_flags(&flags_for_colour(name)).as_deref(), Some(name));
            let background = format!("b-{name}");
            assert_eq!(colour_for_flags(&flags_for_colour(&background)), Some(background));
        }
        assert_eq!(flags_for_colour("chartreuse"), "");
    }
}
