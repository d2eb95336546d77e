use markweave_syntax::DirectiveAttr;

use super::kinds::{
    AtxHeading, BlockQuote, CodeFence, DirectiveFence, DirectiveLine, FenceSig, ListMarker, ThematicBreak,
};

/// The block construct a line could start, judged from the line alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Opener {
    Fence(FenceSig),
    Heading { level: u8, text: String },
    /// `setext` when the break is a plain run of `-` that could instead
    /// underline a preceding paragraph.
    ThematicBreak { setext: bool },
    /// A run of `=`, which only means something below a paragraph.
    SetextEquals,
    Quote,
    ListItem(ListMarker),
    ContainerOpen {
        colons: usize,
        name: String,
        attrs: Vec<DirectiveAttr>,
    },
    ContainerClose { colons: usize },
    Leaf { name: String, attrs: Vec<DirectiveAttr> },
}

/// Classification of a single line containing only local facts.
///
/// This is phase 1 of block parsing: each line is classified independently
/// without reference to surrounding context.
#[derive(Debug, Clone)]
pub struct LineClass<'a> {
    /// Leading spaces, after tab expansion.
    pub indent: usize,
    /// The line after its indentation.
    pub text: &'a str,
    pub is_blank: bool,
    /// Lines indented four or more columns never open a block.
    pub opener: Option<Opener>,
}

pub const CODE_INDENT: usize = 4;

/// Classifies a line whose tabs have already been expanded.
pub fn classify(line: &str) -> LineClass<'_> {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    let text = &line[indent..];
    let is_blank = text.trim().is_empty();
    let opener = if is_blank || indent >= CODE_INDENT {
        None
    } else {
        opener(text)
    };
    LineClass {
        indent,
        text,
        is_blank,
        opener,
    }
}

fn opener(text: &str) -> Option<Opener> {
    if let Some(sig) = CodeFence::sig(text) {
        return Some(Opener::Fence(sig));
    }
    if let Some((level, heading)) = AtxHeading::parse(text) {
        return Some(Opener::Heading {
            level,
            text: heading.to_string(),
        });
    }
    if ThematicBreak::matches(text) {
        return Some(Opener::ThematicBreak {
            setext: ThematicBreak::is_setext_dashes(text),
        });
    }
    if ThematicBreak::is_setext_equals(text) {
        return Some(Opener::SetextEquals);
    }
    if text.starts_with(BlockQuote::PREFIX) {
        return Some(Opener::Quote);
    }
    if let Some(marker) = ListMarker::parse(text) {
        return Some(Opener::ListItem(marker));
    }
    if text.starts_with(DirectiveFence::COLON) {
        return DirectiveFence::classify(text).map(|line| match line {
            DirectiveLine::Open { colons, name, attrs } => Opener::ContainerOpen { colons, name, attrs },
            DirectiveLine::Close { colons } => Opener::ContainerClose { colons },
            DirectiveLine::Leaf { name, attrs } => Opener::Leaf { name, attrs },
        });
    }
    None
}

/// Expand tabs to the next multiple of four columns.
pub fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 8);
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let n = CODE_INDENT - col % CODE_INDENT;
            out.extend(std::iter::repeat_n(' ', n));
            col += n;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

/// Drop up to `n` leading spaces.
pub fn strip_indent(line: &str, n: usize) -> &str {
    let spaces = line.chars().take(n).take_while(|&c| c == ' ').count();
    &line[spaces..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("```rust", "fence")]
    #[case("## Title", "heading")]
    #[case("***", "break")]
    #[case("> quote", "quote")]
    #[case("- item", "list")]
    #[case(":::mermaid", "container")]
    #[case(":::", "close")]
    #[case("::agent{x=1}", "leaf")]
    #[case("plain text", "none")]
    fn classify_openers(#[case] line: &str, #[case] expected: &str) {
        let got = match classify(line).opener {
            Some(Opener::Fence(_)) => "fence",
            Some(Opener::Heading { .. }) => "heading",
            Some(Opener::ThematicBreak { .. }) => "break",
            Some(Opener::SetextEquals) => "equals",
            Some(Opener::Quote) => "quote",
            Some(Opener::ListItem(_)) => "list",
            Some(Opener::ContainerOpen { .. }) => "container",
            Some(Opener::ContainerClose { .. }) => "close",
            Some(Opener::Leaf { .. }) => "leaf",
            None => "none",
        };
        assert_eq!(got, expected);
    }

    #[test]
    fn thematic_break_wins_over_bullet() {
        assert_eq!(classify("- - -").opener, Some(Opener::ThematicBreak { setext: false }));
        assert_eq!(classify("---").opener, Some(Opener::ThematicBreak { setext: true }));
    }

    #[test]
    fn deep_indent_never_opens() {
        let c = classify("    # not a heading");
        assert_eq!(c.indent, 4);
        assert_eq!(c.opener, None);
    }

    #[test]
    fn tabs_expand_to_columns() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tx"), "ab  x");
        assert_eq!(strip_indent("      x", 4), "  x");
        assert_eq!(strip_indent(" x", 4), "x");
    }
}
