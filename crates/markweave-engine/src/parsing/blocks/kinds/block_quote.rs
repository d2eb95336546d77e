/// Blockquote block type with owned delimiter constant.
pub struct BlockQuote;

impl BlockQuote {
    /// The blockquote prefix character.
    pub const PREFIX: char = '>';

    /// Writer-side prefix for every quoted line.
    pub const LINE_PREFIX: &'static str = "> ";

    /// Strips one level of quoting from a line whose indentation has already
    /// been removed, along with one optional following space.
    ///
    /// Returns `None` when the line is not quoted.
    pub fn strip_one(s: &str) -> Option<&str> {
        let rest = s.strip_prefix(Self::PREFIX)?;
        Some(rest.strip_prefix(' ').unwrap_or(rest))
    }
}
