/// Inline link syntax: `[text](destination "title")` and `<scheme:...>`.
pub struct Link;

/// Destination and title following a link's closing bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
    pub title: Option<String>,
    /// Bytes consumed, `(` through `)`.
    pub len: usize,
}

impl Link {
    pub const OPEN: char = '[';
    pub const CLOSE: char = ']';
    pub const DEST_OPEN: char = '(';
    pub const DEST_CLOSE: char = ')';
    pub const AUTO_OPEN: char = '<';
    pub const AUTO_CLOSE: char = '>';

    /// Parses `(dest "title")` at the start of `s`.
    pub fn target(s: &str) -> Option<LinkTarget> {
        let mut chars = s.char_indices().peekable();
        if chars.next()?.1 != Self::DEST_OPEN {
            return None;
        }
        skip_spaces(&mut chars);

        let mut url = String::new();
        if chars.peek().map(|&(_, c)| c) == Some(Self::AUTO_OPEN) {
            chars.next();
            loop {
                match chars.next()? {
                    (_, '>') => break,
                    (_, '<') | (_, '\n') => return None,
                    (_, '\\') => url.push(escaped(&mut chars)),
                    (_, c) => url.push(c),
                }
            }
        } else {
            let mut depth = 0usize;
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || c.is_control() {
                    break;
                }
                if c == '(' {
                    depth += 1;
                } else if c == ')' {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                chars.next();
                if c == '\\' {
                    url.push(escaped(&mut chars));
                } else {
                    url.push(c);
                }
            }
            if depth > 0 {
                return None;
            }
        }

        let had_space = skip_spaces(&mut chars);
        let mut title = None;
        if let Some(&(_, open)) = chars.peek()
            && had_space
            && matches!(open, '"' | '\'' | '(')
        {
            chars.next();
            let close = if open == '(' { ')' } else { open };
            let mut t = String::new();
            loop {
                match chars.next()? {
                    (_, c) if c == close => break,
                    (_, '\\') => t.push(escaped(&mut chars)),
                    (_, c) => t.push(c),
                }
            }
            title = Some(t);
            skip_spaces(&mut chars);
        }

        match chars.next()? {
            (i, ')') => Some(LinkTarget { url, title, len: i + 1 }),
            _ => None,
        }
    }

    /// Parses `<scheme:rest>` at the start of `s`, returning the url and the
    /// bytes consumed.
    pub fn autolink(s: &str) -> Option<(String, usize)> {
        let inner = s.strip_prefix(Self::AUTO_OPEN)?;
        let end = inner.find(Self::AUTO_CLOSE)?;
        let url = &inner[..end];
        let colon = url.find(':')?;
        let scheme = &url[..colon];
        let scheme_ok = (2..=32).contains(&scheme.len())
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
        if !scheme_ok || url.chars().any(|c| c.is_whitespace() || c == '<') {
            return None;
        }
        Some((url.to_string(), end + 2))
    }

    /// Destination as written back out; angle brackets when it holds spaces
    /// or unbalanced parentheses.
    pub fn write_destination(url: &str) -> String {
        let mut depth = 0i32;
        let mut balanced = true;
        for c in url.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        balanced = false;
                    }
                }
                _ => {}
            }
        }
        if url.is_empty() || url.contains(' ') || !balanced || depth != 0 {
            let escaped = url.replace('\\', "\\\\").replace('<', "\\<").replace('>', "\\>");
            format!("<{escaped}>")
        } else {
            url.replace('\\', "\\\\")
        }
    }

    pub fn write_title(title: &str) -> String {
        format!("\"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn skip_spaces(chars: &mut Chars<'_>) -> bool {
    let mut any = false;
    while chars.peek().is_some_and(|&(_, c)| c == ' ' || c == '\t' || c == '\n') {
        chars.next();
        any = true;
    }
    any
}

/// The char after a backslash: escapable punctuation stands for itself,
/// anything else keeps the backslash.
fn escaped(chars: &mut Chars<'_>) -> char {
    match chars.peek() {
        Some(&(_, c)) if c.is_ascii_punctuation() => {
            chars.next();
            c
        }
        _ => '\\',
    }
}
