//! # Directive Attribute Lists
//!
//! Lexes and prints the `{...}` attribute list that follows a directive name.
//!
//! ## Accepted Forms
//!
//! ```text
//! {key=value}            bare value
//! {key="a \"b\""}        double quoted, backslash escapes
//! {key='single'}         single quoted
//! {key={"id":"42"}}      raw JSON object (braces balanced, strings respected)
//! {key=[1,2]}            raw JSON array
//! {#ident .klass flag}   id / class shorthands, valueless flag
//! ```
//!
//! The lexer itself is context-free; [`parse_attributes`] walks the token
//! stream and does the balancing for raw JSON values.

use logos::Logos;

/// Tokens inside a directive attribute list.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum AttrToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=")]
    Eq,

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,

    /// Anything else up to the next structural character
    #[regex(r#"[^ \t\r\n{}\[\]="']+"#)]
    Bare,
}

/// One `key=value` pair, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveAttr {
    pub key: String,
    pub value: String,
}

impl DirectiveAttr {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

type Spanned = (Result<AttrToken, ()>, std::ops::Range<usize>);

/// Parse an attribute list starting at the first byte of `input`, which must
/// be `{`.
///
/// Returns the attributes and the number of bytes consumed (through the
/// closing `}`), or `None` when the list is malformed or unterminated.
pub fn parse_attributes(input: &str) -> Option<(Vec<DirectiveAttr>, usize)> {
    let tokens: Vec<Spanned> = AttrToken::lexer(input).spanned().collect();
    let mut i = 0;

    match tokens.first() {
        Some((Ok(AttrToken::LBrace), _)) => i += 1,
        _ => return None,
    }

    let mut attrs: Vec<DirectiveAttr> = Vec::new();
    loop {
        skip_whitespace(&tokens, &mut i);
        let (tok, span) = tokens.get(i)?.clone();
        match tok {
            Ok(AttrToken::RBrace) => return Some((attrs, span.end)),
            Ok(AttrToken::Bare) => {
                let word = &input[span.clone()];
                i += 1;
                if let Some(id) = word.strip_prefix('#') {
                    attrs.push(DirectiveAttr::new("id", id));
                    continue;
                }
                if let Some(class) = word.strip_prefix('.') {
                    push_class(&mut attrs, class);
                    continue;
                }
                if matches!(tokens.get(i), Some((Ok(AttrToken::Eq), _))) {
                    i += 1;
                    let value = parse_value(input, &tokens, &mut i)?;
                    attrs.push(DirectiveAttr::new(word, value));
                } else {
                    attrs.push(DirectiveAttr::new(word, ""));
                }
            }
            _ => return None,
        }
    }
}

fn skip_whitespace(tokens: &[Spanned], i: &mut usize) {
    while matches!(tokens.get(*i), Some((Ok(AttrToken::Whitespace), _))) {
        *i += 1;
    }
}

fn push_class(attrs: &mut Vec<DirectiveAttr>, class: &str) {
    match attrs.iter_mut().find(|a| a.key == "class") {
        Some(existing) => {
            existing.value.push(' ');
            existing.value.push_str(class);
        }
        None => attrs.push(DirectiveAttr::new("class", class)),
    }
}

fn parse_value(input: &str, tokens: &[Spanned], i: &mut usize) -> Option<String> {
    let (tok, span) = tokens.get(*i)?.clone();
    *i += 1;
    match tok {
        Ok(AttrToken::DoubleQuoted) | Ok(AttrToken::SingleQuoted) => {
            Some(unquote(&input[span.start + 1..span.end - 1]))
        }
        Ok(AttrToken::Bare) => Some(input[span].to_string()),
        Ok(AttrToken::LBrace) | Ok(AttrToken::LBracket) => {
            let start = span.start;
            let mut depth = 1usize;
            while depth > 0 {
                let (tok, span) = tokens.get(*i)?.clone();
                *i += 1;
                match tok {
                    Ok(AttrToken::LBrace) | Ok(AttrToken::LBracket) => depth += 1,
                    Ok(AttrToken::RBrace) | Ok(AttrToken::RBracket) => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(input[start..span.end].to_string());
                        }
                    }
                    // Stray quote inside a raw value
                    Err(()) => return None,
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

fn unquote(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\'' | '\\')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Print an attribute list, including the surrounding braces.
///
/// Values that are balanced JSON objects or arrays are written raw; every
/// other value is double quoted. An empty list prints as `{}`.
pub fn write_attributes(attrs: &[DirectiveAttr]) -> String {
    let mut out = String::from("{");
    for (n, attr) in attrs.iter().enumerate() {
        if n > 0 {
            out.push(' ');
        }
        out.push_str(&attr.key);
        out.push('=');
        if is_raw_json(&attr.value) {
            out.push_str(&attr.value);
        } else {
            out.push('"');
            for c in attr.value.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
    out.push('}');
    out
}

/// True when `value` is a `{...}` or `[...]` run that the parser would read
/// back as one raw value.
fn is_raw_json(value: &str) -> bool {
    if !(value.starts_with('{') || value.starts_with('[')) {
        return false;
    }
    let probe = format!("{{k={value}}}");
    match parse_attributes(&probe) {
        Some((attrs, consumed)) => {
            consumed == probe.len() && attrs.len() == 1 && attrs[0].value == value
        }
        None => false,
    }
}
