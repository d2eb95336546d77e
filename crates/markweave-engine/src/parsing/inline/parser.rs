use tracing::trace;

use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::blocks::kinds::DirectiveFence;

use super::cursor::Cursor;
use super::delimiters::{self, Delim, Item};
use super::kinds::{CodeSpan, Emphasis, Link};

const ESCAPE: char = '\\';

/// Parses the inline content of one block into markdown nodes.
///
/// Constructs are tried in precedence order at each position: escapes, code
/// spans (raw zones), autolinks, text directives, then delimiter runs and
/// link brackets, which are resolved once the whole text has been scanned.
///
/// Never fails: anything that does not form a construct is kept as text.
pub fn parse_inline(s: &str) -> Vec<MdNode> {
    let mut p = InlineParser {
        cur: Cursor::new(s),
        items: Vec::new(),
        text: String::new(),
    };
    p.run();
    p.flush_text();
    delimiters::resolve(p.items)
}

struct InlineParser<'a> {
    cur: Cursor<'a>,
    items: Vec<Item>,
    /// Plain text not yet pushed as an item.
    text: String,
}

impl InlineParser<'_> {
    fn run(&mut self) {
        while let Some(c) = self.cur.peek() {
            match c {
                ESCAPE => self.escape(),
                CodeSpan::TICK => self.code_span(),
                Link::AUTO_OPEN => self.autolink(),
                DirectiveFence::COLON => self.text_directive(),
                Link::OPEN => {
                    self.cur.bump();
                    self.push(Item::Bracket { active: true });
                }
                Link::CLOSE => self.close_bracket(),
                '\n' => self.newline(),
                c if Emphasis::is_delimiter(c) => self.delimiter_run(c),
                c => {
                    self.cur.bump();
                    self.text.push(c);
                }
            }
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.items.push(Item::Text(std::mem::take(&mut self.text)));
        }
    }

    fn push(&mut self, item: Item) {
        self.flush_text();
        self.items.push(item);
    }

    fn escape(&mut self) {
        self.cur.bump();
        match self.cur.peek() {
            Some('\n') => {
                self.cur.bump();
                self.push(Item::Node(MdNode::leaf(MdKind::Break)));
                self.skip_line_indent();
            }
            Some(c) if c.is_ascii_punctuation() => {
                self.cur.bump();
                self.push(Item::Node(MdNode::leaf(MdKind::Escaped(c.to_string()))));
            }
            _ => self.text.push(ESCAPE),
        }
    }

    fn code_span(&mut self) {
        let ticks = self.cur.eat_run(CodeSpan::TICK);
        match CodeSpan::close(self.cur.rest(), ticks) {
            Some((code, used)) => {
                self.cur.bump_n(used);
                self.push(Item::Node(MdNode::new(MdKind::InlineCode, vec![MdNode::text(code)])));
            }
            None => self
                .text
                .push_str(&CodeSpan::TICK.to_string().repeat(ticks)),
        }
    }

    fn autolink(&mut self) {
        match Link::autolink(self.cur.rest()) {
            Some((url, used)) => {
                self.cur.bump_n(used);
                let text = MdNode::text(url.clone());
                self.push(Item::Node(MdNode::new(MdKind::Link { url, title: None }, vec![text])));
            }
            None => {
                self.cur.bump();
                self.text.push(Link::AUTO_OPEN);
            }
        }
    }

    /// `::name{attrs}` inside text. Longer colon runs stay literal.
    fn text_directive(&mut self) {
        let colons = self.cur.eat_run(DirectiveFence::COLON);
        if colons == DirectiveFence::LEAF_COLONS
            && let Some((name, attributes, used)) = DirectiveFence::head(self.cur.rest())
        {
            self.cur.bump_n(used);
            self.push(Item::Node(MdNode::leaf(MdKind::TextDirective { name, attributes })));
            return;
        }
        self.text
            .push_str(&DirectiveFence::COLON.to_string().repeat(colons));
    }

    fn delimiter_run(&mut self, ch: char) {
        let before = self.cur.prev();
        let count = self.cur.eat_run(ch);
        let after = self.cur.peek();
        if ch == Emphasis::TILDE && count != Emphasis::STRIKE_RUN {
            self.text.push_str(&ch.to_string().repeat(count));
            return;
        }
        let (can_open, can_close) = Emphasis::flanking(ch, before, after);
        self.push(Item::Delim(Delim {
            ch,
            count,
            orig: count,
            can_open,
            can_close,
        }));
    }

    fn close_bracket(&mut self) {
        self.cur.bump();
        self.flush_text();
        let Some(open) = self
            .items
            .iter()
            .rposition(|i| matches!(i, Item::Bracket { .. }))
        else {
            self.text.push(Link::CLOSE);
            return;
        };
        let active = matches!(self.items[open], Item::Bracket { active: true });
        let target = active.then(|| Link::target(self.cur.rest())).flatten();
        let Some(target) = target else {
            self.items[open] = Item::Text(Link::OPEN.to_string());
            self.text.push(Link::CLOSE);
            return;
        };

        self.cur.bump_n(target.len);
        trace!(url = %target.url, "link");
        let inner: Vec<Item> = self.items.drain(open + 1..).collect();
        self.items.pop();
        let children = delimiters::resolve(inner);
        self.items.push(Item::Node(MdNode::new(
            MdKind::Link {
                url: target.url,
                title: target.title,
            },
            children,
        )));
        // No links inside links
        for item in &mut self.items {
            if let Item::Bracket { active } = item {
                *active = false;
            }
        }
    }

    /// Soft breaks stay in the text; two or more trailing spaces make a hard
    /// break.
    fn newline(&mut self) {
        self.cur.bump();
        let trimmed = self.text.trim_end_matches(' ');
        let hard = self.text.len() - trimmed.len() >= 2;
        self.text.truncate(trimmed.len());
        if hard {
            self.push(Item::Node(MdNode::leaf(MdKind::Break)));
        } else {
            self.text.push('\n');
        }
        self.skip_line_indent();
    }

    fn skip_line_indent(&mut self) {
        while self.cur.peek() == Some(' ') {
            self.cur.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rstest::rstest;

    fn dump(s: &str) -> String {
        MdNode::new(MdKind::Paragraph, parse_inline(s)).dump()
    }

    #[test]
    fn emphasis_strong_and_strike() {
        assert_snapshot!(dump("a *b* **c** ~~d~~ _e_"), @r#"
        paragraph
          text "a "
          emphasis
            text "b"
          text " "
          strong
            text "c"
          text " "
          delete
            text "d"
          text " "
          emphasis
            text "e"
        "#);
    }

    #[test]
    fn intraword_underscore_is_literal() {
        assert_snapshot!(dump("snake_case_name"), @r#"
        paragraph
          text "snake_case_name"
        "#);
    }

    #[test]
    fn code_span_is_a_raw_zone() {
        assert_snapshot!(dump("`*not* [x](y)` ok"), @r#"
        paragraph
          inlineCode
            text "*not* [x](y)"
          text " ok"
        "#);
    }

    #[test]
    fn links_with_nested_emphasis() {
        assert_snapshot!(dump(r#"see [the **docs**](https://d.dev "Docs") and <https://a.b>"#), @r#"
        paragraph
          text "see "
          link https://d.dev
            text "the "
            strong
              text "docs"
          text " and "
          link https://a.b
            text "https://a.b"
        "#);
    }

    #[test]
    fn escapes_stay_separate() {
        assert_snapshot!(dump(r"\*a\* \q"), @r#"
        paragraph
          text "*"
          text "a"
          text "*"
          text " \\q"
        "#);
    }

    #[test]
    fn hard_and_soft_breaks() {
        assert_snapshot!(dump("a  \nb\\\nc\n  d"), @r#"
        paragraph
          text "a"
          break
          text "b"
          break
          text "c\nd"
        "#);
    }

    #[test]
    fn text_directive() {
        assert_snapshot!(dump(r#"rev ::metric{metric={"id":"42"}} now"#), @r#"
        paragraph
          text "rev "
          textDirective metric metric={"id":"42"}
          text " now"
        "#);
    }

    #[rstest]
    #[case("[dangling")]
    #[case("a ] b")]
    #[case("[text] (no)")]
    #[case("**unclosed")]
    #[case("~single~")]
    #[case("::: not")]
    fn unmatched_syntax_is_text(#[case] input: &str) {
        let nodes = parse_inline(input);
        assert_eq!(nodes.len(), 1, "{nodes:?}");
        assert_eq!(nodes[0].text_content(), input);
    }
}
