use std::fmt;

use thiserror::Error;

use super::schema::Group;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentExprError {
    #[error("unexpected character {found:?} at {at} in content expression {source_text:?}")]
    UnexpectedChar {
        found: char,
        at: usize,
        source_text: String,
    },

    #[error("unclosed group in content expression {0:?}")]
    UnclosedGroup(String),

    #[error("empty choice in content expression {0:?}")]
    EmptyChoice(String),
}

/// Anything that can be checked against a content expression.
pub trait ContentItem {
    fn kind_name(&self) -> &str;
    fn group(&self) -> Group;
}

/// One slot of a filled content sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filled<'e> {
    /// An existing item, by index.
    Item(usize),
    /// A required kind or group name with no item to fill it.
    Missing(&'e str),
}

/// A parsed content expression such as `"paragraph block*"` or
/// `"(paragraph | heading)+"`.
///
/// Each term names a kind or a group (`block`, `inline`), optionally a
/// parenthesized choice, followed by an optional `*`, `+` or `?`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentExpr {
    source: String,
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    choices: Vec<String>,
    min: usize,
    max: Option<usize>,
}

impl Term {
    fn accepts(&self, item: &impl ContentItem) -> bool {
        self.choices
            .iter()
            .any(|c| c == item.kind_name() || c == item.group().as_str())
    }
}

impl ContentExpr {
    pub fn parse(source: &str) -> Result<Self, ContentExprError> {
        let chars: Vec<(usize, char)> = source.char_indices().collect();
        let mut terms = Vec::new();
        let mut i = 0;

        let unexpected = |at: usize, found: char| ContentExprError::UnexpectedChar {
            found,
            at,
            source_text: source.to_string(),
        };

        while i < chars.len() {
            let (at, c) = chars[i];
            let choices = if c.is_whitespace() {
                i += 1;
                continue;
            } else if c == '(' {
                i += 1;
                let mut choices = Vec::new();
                loop {
                    while i < chars.len() && chars[i].1.is_whitespace() {
                        i += 1;
                    }
                    let name = take_name(&chars, &mut i);
                    if name.is_empty() {
                        return match chars.get(i) {
                            None => Err(ContentExprError::UnclosedGroup(source.to_string())),
                            Some(_) => Err(ContentExprError::EmptyChoice(source.to_string())),
                        };
                    }
                    choices.push(name);
                    while i < chars.len() && chars[i].1.is_whitespace() {
                        i += 1;
                    }
                    match chars.get(i) {
                        Some((_, '|')) => i += 1,
                        Some((_, ')')) => {
                            i += 1;
                            break;
                        }
                        Some(&(at, found)) => return Err(unexpected(at, found)),
                        None => return Err(ContentExprError::UnclosedGroup(source.to_string())),
                    }
                }
                choices
            } else if is_name_char(c) {
                vec![take_name(&chars, &mut i)]
            } else {
                return Err(unexpected(at, c));
            };

            let (min, max) = match chars.get(i).map(|(_, c)| *c) {
                Some('*') => {
                    i += 1;
                    (0, None)
                }
                Some('+') => {
                    i += 1;
                    (1, None)
                }
                Some('?') => {
                    i += 1;
                    (0, Some(1))
                }
                _ => (1, Some(1)),
            };
            terms.push(Term { choices, min, max });
        }

        Ok(Self {
            source: source.trim().to_string(),
            terms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// No terms: the kind is a leaf.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Every kind or group name the expression refers to.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .flat_map(|t| t.choices.iter().map(String::as_str))
    }

    /// True when the whole sequence satisfies the expression.
    pub fn matches<T: ContentItem>(&self, items: &[T]) -> bool {
        self.match_from(0, items, 0)
    }

    /// True when some term could hold `item`, regardless of position.
    pub fn accepts<T: ContentItem>(&self, item: &T) -> bool {
        self.terms.iter().any(|t| t.accepts(item))
    }

    /// The first choice of every required term, repeated `min` times.
    /// Used to fill a node with the smallest valid content.
    pub fn required(&self) -> Vec<&str> {
        self.terms
            .iter()
            .flat_map(|t| std::iter::repeat_n(t.choices[0].as_str(), t.min))
            .collect()
    }

    /// Walk the terms greedily and report where required items are missing.
    /// `None` when some items cannot be placed at all.
    pub fn fill<T: ContentItem>(&self, items: &[T]) -> Option<Vec<Filled<'_>>> {
        let mut out = Vec::with_capacity(items.len());
        let mut ci = 0;
        for term in &self.terms {
            let mut n = 0;
            while ci < items.len() && term.max.is_none_or(|max| n < max) && term.accepts(&items[ci]) {
                out.push(Filled::Item(ci));
                ci += 1;
                n += 1;
            }
            for _ in n..term.min {
                out.push(Filled::Missing(term.choices[0].as_str()));
            }
        }
        (ci == items.len()).then_some(out)
    }

    fn match_from<T: ContentItem>(&self, ti: usize, items: &[T], ci: usize) -> bool {
        let Some(term) = self.terms.get(ti) else {
            return ci == items.len();
        };
        let mut n = 0;
        while ci + n < items.len()
            && term.max.is_none_or(|max| n < max)
            && term.accepts(&items[ci + n])
        {
            n += 1;
        }
        if n < term.min {
            return false;
        }
        (term.min..=n)
            .rev()
            .any(|k| self.match_from(ti + 1, items, ci + k))
    }
}

impl fmt::Display for ContentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_name(chars: &[(usize, char)], i: &mut usize) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.get(*i) {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        *i += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct Item(&'static str, Group);

    impl ContentItem for Item {
        fn kind_name(&self) -> &str {
            self.0
        }
        fn group(&self) -> Group {
            self.1
        }
    }

    fn para() -> Item {
        Item("paragraph", Group::Block)
    }
    fn heading() -> Item {
        Item("heading", Group::Block)
    }
    fn list() -> Item {
        Item("bulletList", Group::Block)
    }
    fn text() -> Item {
        Item("text", Group::Inline)
    }

    #[test]
    fn empty_expression_is_leaf() {
        let expr = ContentExpr::parse("").unwrap();
        assert!(expr.is_empty());
        assert!(expr.matches::<Item>(&[]));
        assert!(!expr.matches(&[text()]));
    }

    #[rstest]
    #[case("block+", vec![], false)]
    #[case("block+", vec![para(), heading()], true)]
    #[case("block*", vec![], true)]
    #[case("inline*", vec![text(), text()], true)]
    #[case("inline*", vec![para()], false)]
    #[case("paragraph block*", vec![para(), list(), para()], true)]
    #[case("paragraph block*", vec![list(), para()], false)]
    #[case("heading? paragraph", vec![para()], true)]
    #[case("heading? paragraph", vec![heading(), heading(), para()], false)]
    #[case("(paragraph | heading)+", vec![heading(), para()], true)]
    #[case("(paragraph | heading)+", vec![list()], false)]
    #[case("block* paragraph", vec![list(), para(), para()], true)]
    fn matching(#[case] src: &str, #[case] items: Vec<Item>, #[case] expected: bool) {
        let expr = ContentExpr::parse(src).unwrap();
        assert_eq!(expr.matches(&items), expected, "{src}");
    }

    #[test]
    fn accepts_checks_any_term() {
        let expr = ContentExpr::parse("paragraph block*").unwrap();
        assert!(expr.accepts(&list()));
        assert!(!expr.accepts(&text()));
    }

    #[test]
    fn references_and_required() {
        let expr = ContentExpr::parse("paragraph (bulletList|orderedList)* block+").unwrap();
        let refs: Vec<&str> = expr.references().collect();
        assert_eq!(refs, vec!["paragraph", "bulletList", "orderedList", "block"]);
        assert_eq!(expr.required(), vec!["paragraph", "block"]);
    }

    #[test]
    fn fill_inserts_missing_required_items() {
        let expr = ContentExpr::parse("paragraph block*").unwrap();
        assert_eq!(
            expr.fill(&[list()]),
            Some(vec![Filled::Missing("paragraph"), Filled::Item(0)])
        );
        assert_eq!(expr.fill(&[text()]), None);
        let doc = ContentExpr::parse("block+").unwrap();
        assert_eq!(doc.fill::<Item>(&[]), Some(vec![Filled::Missing("block")]));
    }

    #[rstest]
    #[case("block+ !")]
    #[case("(paragraph | heading")]
    #[case("(|paragraph)")]
    fn invalid_expressions(#[case] src: &str) {
        assert!(ContentExpr::parse(src).is_err());
    }
}
