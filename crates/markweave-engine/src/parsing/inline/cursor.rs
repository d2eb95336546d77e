/// A cursor for character-by-character inline parsing.
///
/// Indices are byte offsets into `s` and always sit on a char boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being parsed.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns true if at end of string.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current char without advancing.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The char after the current one.
    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// The char just before the cursor.
    pub fn prev(&self) -> Option<char> {
        self.s.get(..self.i).and_then(|s| s.chars().next_back())
    }

    /// Remaining input.
    pub fn rest(&self) -> &'a str {
        self.s.get(self.i..).unwrap_or("")
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    /// Advances by one char, returning it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += c.len_utf8();
        Some(c)
    }

    /// Advances by `n` bytes, clamped to the end of input.
    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    /// Consumes a run of `c`, returning its length in chars.
    pub fn eat_run(&mut self, c: char) -> usize {
        let mut n = 0;
        while self.peek() == Some(c) {
            self.bump();
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello");
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some('h'));
        assert_eq!(cur.bump(), Some('h'));
        assert_eq!(cur.prev(), Some('h'));
        assert_eq!(cur.rest(), "ello");
    }

    #[test]
    fn cursor_starts_with() {
        let cur = Cursor::new("::metric");
        assert!(cur.starts_with("::"));
        assert!(!cur.starts_with(":::"));
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.prev(), None);
    }

    #[test]
    fn multibyte_chars_advance_whole() {
        let mut cur = Cursor::new("é*");
        assert_eq!(cur.bump(), Some('é'));
        assert_eq!(cur.i, 2);
        assert_eq!(cur.peek(), Some('*'));
        assert_eq!(cur.prev(), Some('é'));
    }

    #[test]
    fn bump_n_clamps_at_end() {
        let mut cur = Cursor::new("hi");
        cur.bump_n(10);
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn eat_run_counts_chars() {
        let mut cur = Cursor::new("***x");
        assert_eq!(cur.eat_run('*'), 3);
        assert_eq!(cur.peek(), Some('x'));
        assert_eq!(cur.peek_second(), None);
    }
}
