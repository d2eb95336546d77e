/// Delimiter runs for emphasis, strong emphasis and strikethrough.
pub struct Emphasis;

impl Emphasis {
    pub const STAR: char = '*';
    pub const UNDERSCORE: char = '_';
    pub const TILDE: char = '~';
    /// Strikethrough needs a run of exactly this many tildes. Single tildes
    /// are left to the subscript decoration.
    pub const STRIKE_RUN: usize = 2;

    pub fn is_delimiter(c: char) -> bool {
        matches!(c, Self::STAR | Self::UNDERSCORE | Self::TILDE)
    }

    /// Whether a run of `ch` between `before` and `after` can open and close
    /// emphasis. `None` stands for the start or end of the text.
    pub fn flanking(ch: char, before: Option<char>, after: Option<char>) -> (bool, bool) {
        let before = before.unwrap_or(' ');
        let after = after.unwrap_or(' ');
        let (ws_before, ws_after) = (before.is_whitespace(), after.is_whitespace());
        let (p_before, p_after) = (is_punctuation(before), is_punctuation(after));

        let left = !ws_after && (!p_after || ws_before || p_before);
        let right = !ws_before && (!p_before || ws_after || p_after);

        if ch == Self::UNDERSCORE {
            (left && (!right || p_before), right && (!left || p_after))
        } else {
            (left, right)
        }
    }
}

pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace())
}
