/// A list item marker at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub ordered: bool,
    pub start: u64,
    /// `-`, `*`, `+` for bullets, `.` or `)` for ordered items.
    pub delim: char,
    /// Bytes from the marker to the item's content.
    pub content_offset: usize,
    /// Nothing follows the marker.
    pub empty: bool,
}

impl ListMarker {
    pub const BULLETS: [char; 3] = ['-', '*', '+'];
    pub const ORDERED_DELIMS: [char; 2] = ['.', ')'];
    pub const MAX_DIGITS: usize = 9;

    pub fn parse(text: &str) -> Option<Self> {
        let first = text.chars().next()?;
        let (ordered, start, delim, width) = if Self::BULLETS.contains(&first) {
            (false, 1, first, 1)
        } else {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            if digits == 0 || digits > Self::MAX_DIGITS {
                return None;
            }
            let delim = text[digits..].chars().next()?;
            if !Self::ORDERED_DELIMS.contains(&delim) {
                return None;
            }
            let start = text[..digits].parse().ok()?;
            (true, start, delim, digits + 1)
        };

        let rest = &text[width..];
        if rest.trim().is_empty() {
            return Some(Self {
                ordered,
                start,
                delim,
                content_offset: width + 1,
                empty: true,
            });
        }
        let spaces = rest.chars().take_while(|&c| c == ' ').count();
        if spaces == 0 {
            return None;
        }
        // Five or more spaces: the content is indented code, one space belongs to the marker
        let spaces = if spaces > 4 { 1 } else { spaces };
        Some(Self {
            ordered,
            start,
            delim,
            content_offset: width + spaces,
            empty: false,
        })
    }

    /// Another item of the same list.
    pub fn continues(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.delim == other.delim
    }
}

/// `[ ]` or `[x]` at the start of a list item.
pub struct TaskMarker;

impl TaskMarker {
    pub const UNCHECKED: &'static str = "[ ]";
    pub const CHECKED: &'static str = "[x]";

    /// Checked state and the item text after the marker.
    pub fn parse(text: &str) -> Option<(bool, &str)> {
        let checked = match text.get(..3)? {
            "[ ]" => false,
            "[x]" | "[X]" => true,
            _ => return None,
        };
        let rest = &text[3..];
        if rest.is_empty() {
            return Some((checked, rest));
        }
        rest.strip_prefix([' ', '\t']).map(|r| (checked, r))
    }

    pub fn write(checked: bool) -> &'static str {
        if checked { Self::CHECKED } else { Self::UNCHECKED }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("- item", false, 1, '-', 2)]
    #[case("*   item", false, 1, '*', 4)]
    #[case("3. item", true, 3, '.', 3)]
    #[case("10) item", true, 10, ')', 4)]
    #[case("-      code", false, 1, '-', 2)]
    fn parse_markers(
        #[case] line: &str,
        #[case] ordered: bool,
        #[case] start: u64,
        #[case] delim: char,
        #[case] offset: usize,
    ) {
        let m = ListMarker::parse(line).unwrap();
        assert_eq!((m.ordered, m.start, m.delim, m.content_offset), (ordered, start, delim, offset));
        assert!(!m.empty);
    }

    #[rstest]
    #[case("-item")]
    #[case("1.5 apples")]
    #[case("1234567890. too long")]
    #[case("text")]
    fn not_markers(#[case] line: &str) {
        assert_eq!(ListMarker::parse(line), None);
    }

    #[test]
    fn empty_item() {
        let m = ListMarker::parse("-").unwrap();
        assert!(m.empty);
        assert_eq!(m.content_offset, 2);
    }

    #[test]
    fn task_markers() {
        assert_eq!(TaskMarker::parse("[ ] todo"), Some((false, "todo")));
        assert_eq!(TaskMarker::parse("[X] done"), Some((true, "done")));
        assert_eq!(TaskMarker::parse("[x]"), Some((true, "")));
        assert_eq!(TaskMarker::parse("[x]done"), None);
        assert_eq!(TaskMarker::parse("[link](x)"), None);
    }
}
