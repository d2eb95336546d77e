/// `---`, `***` or `___`, optionally spaced.
pub struct ThematicBreak;

impl ThematicBreak {
    pub const MARKERS: [char; 3] = ['-', '*', '_'];
    pub const CANONICAL: &'static str = "---";

    pub fn matches(text: &str) -> bool {
        let mut chars = text.chars().filter(|c| !c.is_whitespace());
        let Some(first) = chars.next() else {
            return false;
        };
        if !Self::MARKERS.contains(&first) {
            return false;
        }
        let mut count = 1;
        for c in chars {
            if c != first {
                return false;
            }
            count += 1;
        }
        count >= 3
    }

    /// A run of `-` with no inner spaces, which may instead underline a
    /// setext heading when it follows a paragraph.
    pub fn is_setext_dashes(text: &str) -> bool {
        let t = text.trim_end();
        !t.is_empty() && t.chars().all(|c| c == '-')
    }

    /// A run of `=` underlining a level 1 setext heading.
    pub fn is_setext_equals(text: &str) -> bool {
        let t = text.trim_end();
        !t.is_empty() && t.chars().all(|c| c == '=')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("---", true)]
    #[case("* * *", true)]
    #[case("___", true)]
    #[case("--", false)]
    #[case("-*-", false)]
    #[case("--- a", false)]
    fn matches_breaks(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(ThematicBreak::matches(line), expected);
    }

    #[test]
    fn setext_underlines() {
        assert!(ThematicBreak::is_setext_dashes("---  "));
        assert!(!ThematicBreak::is_setext_dashes("- - -"));
        assert!(ThematicBreak::is_setext_equals("=="));
    }
}
