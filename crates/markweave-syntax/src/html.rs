//! # HTML Fragment Lexer
//!
//! A tolerant tokenizer for clipboard HTML. It makes no attempt at the HTML5
//! tree construction algorithm: callers get a flat stream of [`HtmlEvent`]s
//! and decide for themselves how to nest them.
//!
//! ```text
//! <p>Hi <b>there</b></p>
//!  │   │  │    │    │
//!  │   │  │    │    └─ End("p")
//!  │   │  │    └────── End("b")
//!  │   │  └─────────── Start(b) Text("there")
//!  │   └────────────── Text("Hi ")
//!  └────────────────── Start(p)
//! ```
//!
//! Comments, doctypes and processing instructions are consumed and dropped.
//! A stray `<` that does not open a tag is reported as text. Entity decoding
//! is left to the caller.

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum HtmlToken {
    /// `<!-- ... -->`, `<!DOCTYPE ...>` and friends
    #[token("<!", bang)]
    Markup,

    /// `<?xml ... ?>`
    #[token("<?", question)]
    Instruction,

    #[regex(r"</[A-Za-z][A-Za-z0-9:-]*[ \t\r\n]*>")]
    EndTag,

    #[regex(r#"<[A-Za-z][A-Za-z0-9:-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    #[regex(r"[^<]+")]
    Text,

    #[token("<")]
    Lt,
}

fn bang(lex: &mut Lexer<HtmlToken>) -> bool {
    let rest = lex.remainder();
    let end = if let Some(body) = rest.strip_prefix("--") {
        body.find("-->").map(|i| i + 2 + 3)
    } else {
        rest.find('>').map(|i| i + 1)
    };
    lex.bump(end.unwrap_or(rest.len()));
    true
}

fn question(lex: &mut Lexer<HtmlToken>) -> bool {
    let rest = lex.remainder();
    let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
    lex.bump(end);
    true
}

/// Tokens inside a start tag, between the name and the closing `>`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum TagToken {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[token("/")]
    Slash,

    #[regex(r#"[^ \t\r\n="'/<>]+"#)]
    Word,
}

/// A parsed start tag. Names are lowercased; attribute values are raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl Tag {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == key)
    }

    /// Elements that never have content or an end tag.
    pub fn is_void(&self) -> bool {
        matches!(
            self.name.as_str(),
            "br" | "hr"
                | "img"
                | "input"
                | "meta"
                | "link"
                | "col"
                | "area"
                | "base"
                | "embed"
                | "source"
                | "track"
                | "wbr"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent<'a> {
    Start(Tag),
    End(String),
    Text(&'a str),
}

/// Lex `input` into start, end and text events.
pub fn events(input: &str) -> Vec<HtmlEvent<'_>> {
    let mut out = Vec::new();
    let mut lexer = HtmlToken::lexer(input);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        match result {
            Ok(HtmlToken::StartTag) => out.push(HtmlEvent::Start(parse_start_tag(text))),
            Ok(HtmlToken::EndTag) => {
                let name = text[2..text.len() - 1].trim().to_ascii_lowercase();
                out.push(HtmlEvent::End(name));
            }
            Ok(HtmlToken::Markup) | Ok(HtmlToken::Instruction) => {}
            // A lone `<` or anything unrecognized is just text
            Ok(HtmlToken::Text) | Ok(HtmlToken::Lt) | Err(()) => out.push(HtmlEvent::Text(text)),
        }
    }

    out
}

fn parse_start_tag(text: &str) -> Tag {
    let inner = &text[1..text.len() - 1];
    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let rest = &inner[name_end..];
    let tokens: Vec<(Result<TagToken, ()>, std::ops::Range<usize>)> =
        TagToken::lexer(rest).spanned().collect();

    let mut attrs = Vec::new();
    let mut self_closing = false;
    let mut i = 0;
    while let Some((tok, span)) = tokens.get(i) {
        i += 1;
        match tok {
            Ok(TagToken::Word) => {
                let key = rest[span.clone()].to_ascii_lowercase();
                if matches!(tokens.get(i), Some((Ok(TagToken::Eq), _))) {
                    let value = match tokens.get(i + 1) {
                        Some((Ok(TagToken::DoubleQuoted | TagToken::SingleQuoted), vspan)) => {
                            rest[vspan.start + 1..vspan.end - 1].to_string()
                        }
                        Some((Ok(TagToken::Word), vspan)) => rest[vspan.clone()].to_string(),
                        _ => String::new(),
                    };
                    i += 2;
                    attrs.push((key, value));
                } else {
                    attrs.push((key, String::new()));
                }
            }
            Ok(TagToken::Slash) => self_closing = i == tokens.len(),
            _ => {}
        }
    }

    Tag {
        name,
        attrs,
        self_closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn start(name: &str, attrs: &[(&str, &str)]) -> HtmlEvent<'static> {
        HtmlEvent::Start(Tag {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        })
    }

    fn end(name: &str) -> HtmlEvent<'static> {
        HtmlEvent::End(name.to_string())
    }

    #[test]
    fn empty_input() {
        assert_eq!(events(""), vec![]);
    }

    #[test]
    fn simple_paragraph() {
        assert_eq!(
            events("<p>Hello</p>"),
            vec![start("p", &[]), HtmlEvent::Text("Hello"), end("p")]
        );
    }

    #[test]
    fn attributes_in_all_quote_styles() {
        assert_eq!(
            events(r#"<A HREF="x>y" title='t' data-flag id=plain>"#),
            vec![start(
                "a",
                &[("href", "x>y"), ("title", "t"), ("data-flag", ""), ("id", "plain")]
            )]
        );
    }

    #[test]
    fn self_closing_and_void() {
        let evs = events("<br/><hr>");
        match &evs[0] {
            HtmlEvent::Start(tag) => {
                assert_eq!(tag.name, "br");
                assert!(tag.self_closing);
                assert!(tag.is_void());
            }
            other => panic!("unexpected {other:?}"),
        }
        match &evs[1] {
            HtmlEvent::Start(tag) => assert!(!tag.self_closing && tag.is_void()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comments_and_doctype_are_dropped() {
        assert_eq!(
            events("<!DOCTYPE html><!-- a <b> comment -->x<?xml v?>"),
            vec![HtmlEvent::Text("x")]
        );
    }

    #[test]
    fn unterminated_comment_swallows_rest() {
        assert_eq!(events("a<!-- never closed"), vec![HtmlEvent::Text("a")]);
    }

    #[test]
    fn stray_less_than_is_text() {
        assert_eq!(
            events("1 < 2"),
            vec![
                HtmlEvent::Text("1 "),
                HtmlEvent::Text("<"),
                HtmlEvent::Text(" 2")
            ]
        );
    }

    #[test]
    fn clipboard_fragment_stream() {
        let input = "<meta charset='utf-8'><ul><li><strong>One</strong></li><li>Two</li></ul>";
        let rendered: Vec<String> = events(input)
            .into_iter()
            .map(|ev| match ev {
                HtmlEvent::Start(tag) => format!("+{}", tag.name),
                HtmlEvent::End(name) => format!("-{name}"),
                HtmlEvent::Text(t) => format!("{t:?}"),
            })
            .collect();
        assert_snapshot!(rendered.join(" "), @r#"+meta +ul +li +strong "One" -strong -li +li "Two" -li -ul"#);
    }
}
