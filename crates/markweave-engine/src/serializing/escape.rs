//! Backslash escaping for text written into markdown.
//!
//! Only characters that would change the parse are escaped. Whether a
//! character matters can depend on what was already written, so escaping
//! works against the output buffer rather than the text alone.

use crate::parsing::processor::{Processor, Shape};

/// Escaped wherever they appear.
const ALWAYS: [char; 9] = ['\\', '*', '_', '`', '[', ']', '<', '~', '^'];

/// Escaped as the first character of a line.
const LINE_START: [char; 5] = ['#', '>', '-', '+', '='];

/// Directive marker; escaped when doubled.
const COLON: char = ':';

pub struct Escaper {
    /// Markers of doubled decorations (`==`, `++`).
    doubled: Vec<char>,
    /// Markers of single decorations (`~x~`, `^x^`).
    single: Vec<char>,
}

/// Where a piece of text is being written.
#[derive(Debug, Clone, Default)]
pub struct TextContext {
    /// Decoration markers open around the text.
    pub inside: Vec<char>,
    /// Heading text: newlines become spaces and a trailing `#` run is
    /// escaped.
    pub single_line: bool,
}

impl Escaper {
    pub fn new(processor: &Processor) -> Self {
        let mut doubled = Vec::new();
        let mut single = Vec::new();
        for (marker, shape) in processor.markers() {
            match shape {
                Shape::Double { .. } => doubled.push(marker),
                Shape::Single => single.push(marker),
            }
        }
        Self { doubled, single }
    }

    /// Append `text` to `out`, escaped.
    ///
    /// Spaces at the start of a line are dropped and trailing spaces before a
    /// newline are trimmed: the parser would strip both. Blank lines collapse,
    /// since a blank line would end the paragraph.
    pub fn write(&self, text: &str, ctx: &TextContext, out: &mut String) {
        let chars: Vec<char> = text.chars().collect();
        let mut digits_at_line_start = false;
        for (i, &c) in chars.iter().enumerate() {
            let line_start = out.is_empty() || out.ends_with('\n');
            if c == '\n' {
                if ctx.single_line {
                    out.push(' ');
                } else if !line_start {
                    let trimmed = out.trim_end_matches([' ', '\t']).len();
                    out.truncate(trimmed);
                    out.push('\n');
                }
                digits_at_line_start = false;
                continue;
            }
            if line_start && (c == ' ' || c == '\t') {
                continue;
            }
            let prev = out.chars().next_back();
            let next = chars.get(i + 1).copied();

            let escape = ALWAYS.contains(&c)
                || self.single.contains(&c)
                || (line_start && LINE_START.contains(&c))
                || (digits_at_line_start && (c == '.' || c == ')'))
                || (self.doubled.contains(&c) && (prev == Some(c) || next == Some(c) || ctx.inside.contains(&c)))
                || (c == COLON && (prev == Some(COLON) || next == Some(COLON)))
                || (ctx.single_line && c == '#' && chars[i..].iter().all(|&r| r == '#' || r.is_whitespace()));

            digits_at_line_start = c.is_ascii_digit() && (line_start || digits_at_line_start);
            if escape {
                out.push('\\');
            }
            out.push(c);
        }
    }
}

/// Escape the last character of `out` if it is an unescaped `c`. Used before
/// writing syntax that would join with it, such as `==` after a text `=`.
pub fn escape_trailing(out: &mut String, c: char) {
    let Some(body_len) = out.strip_suffix(c).map(str::len) else {
        return;
    };
    let slashes = out[..body_len].chars().rev().take_while(|&ch| ch == '\\').count();
    if slashes % 2 == 0 {
        out.insert(body_len, '\\');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn escaper() -> Escaper {
        let mut p = Processor::new();
        p.decoration("underline", '+', Shape::Double { flags: false });
        p.decoration("highlight", '=', Shape::Double { flags: true });
        p.decoration("subscript", '~', Shape::Single);
        p.decoration("superscript", '^', Shape::Single);
        Escaper::new(&p)
    }

    fn escaped(text: &str) -> String {
        let mut out = String::new();
        escaper().write(text, &TextContext::default(), &mut out);
        out
    }

    #[rstest]
    #[case("plain words", "plain words")]
    #[case("a * b", r"a \* b")]
    #[case("snake_case", r"snake\_case")]
    #[case("[not a link]", r"\[not a link\]")]
    #[case("a < b", r"a \< b")]
    #[case("H~2~O", r"H\~2\~O")]
    #[case("x^2", r"x\^2")]
    #[case("a = b", "a = b")]
    #[case("a == b", r"a \=\= b")]
    #[case("c++", r"c\+\+")]
    #[case("1 + 1", "1 + 1")]
    #[case("Note: this", "Note: this")]
    #[case("a::b", r"a\:\:b")]
    #[case("# not a heading", r"\# not a heading")]
    #[case("- not a list", r"\- not a list")]
    #[case("> not a quote", r"\> not a quote")]
    #[case("1. not a list", r"1\. not a list")]
    #[case("2024) no", r"2024\) no")]
    #[case("version 1.2", "version 1.2")]
    #[case("a\n- b", "a\n\\- b")]
    #[case("a  \nb", "a\nb")]
    #[case("a\n   b", "a\nb")]
    #[case("a\n\nb", "a\nb")]
    fn escapes_only_what_would_change_the_parse(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(escaped(text), expected);
    }

    #[test]
    fn doubled_marker_inside_its_decoration() {
        let mut out = String::new();
        let ctx = TextContext {
            inside: vec!['='],
            single_line: false,
        };
        escaper().write("a=b", &ctx, &mut out);
        assert_eq!(out, r"a\=b");
    }

    #[test]
    fn heading_text_stays_on_one_line() {
        let mut out = String::new();
        let ctx = TextContext {
            inside: Vec::new(),
            single_line: true,
        };
        escaper().write("C#\nand F #", &ctx, &mut out);
        assert_eq!(out, r"C# and F \#");
    }

    #[rstest]
    #[case("a=", '=', r"a\=")]
    #[case(r"a\=", '=', r"a\=")]
    #[case(r"a\\=", '=', r"a\\\=")]
    #[case("a", '=', "a")]
    fn trailing_marker(#[case] before: &str, #[case] c: char, #[case] expected: &str) {
        let mut out = before.to_string();
        escape_trailing(&mut out, c);
        assert_eq!(out, expected);
    }
}
