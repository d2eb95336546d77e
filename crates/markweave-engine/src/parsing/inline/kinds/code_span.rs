/// Code span inline type with owned delimiter constant.
///
/// Code spans are raw zones: no other inline parsing occurs inside them.
pub struct CodeSpan;

impl CodeSpan {
    /// The backtick character that delimits code spans.
    pub const TICK: char = '`';

    /// Given the input right after an opening run of `ticks` backticks, finds
    /// the closing run of exactly the same length.
    ///
    /// Returns the normalized code and the bytes consumed, closing run
    /// included.
    pub fn close(rest: &str, ticks: usize) -> Option<(String, usize)> {
        let mut i = 0;
        while i < rest.len() {
            let Some(off) = rest[i..].find(Self::TICK) else {
                return None;
            };
            let start = i + off;
            let run = rest[start..].chars().take_while(|&c| c == Self::TICK).count();
            let end = start + run;
            if run == ticks {
                return Some((Self::normalize(&rest[..start]), end));
            }
            i = end;
        }
        None
    }

    /// Line endings become spaces; one space is stripped from each side
    /// when both sides have one and the code is not all spaces.
    fn normalize(raw: &str) -> String {
        let code = raw.replace('\n', " ");
        if code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty() {
            code[1..code.len() - 1].to_string()
        } else {
            code
        }
    }

    /// Delimiters for writing `code`: one backtick longer than any run
    /// inside, padded when the code touches a backtick or a space.
    pub fn wrap(code: &str) -> String {
        let mut longest = 0;
        let mut run = 0;
        for c in code.chars() {
            if c == Self::TICK {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        // shortest run length not present in the code
        let mut ticks = 1;
        while ticks <= longest && contains_run(code, ticks) {
            ticks += 1;
        }
        let fence = Self::TICK.to_string().repeat(ticks);
        let pad = code.starts_with(Self::TICK)
            || code.ends_with(Self::TICK)
            || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
        if pad {
            format!("{fence} {code} {fence}")
        } else {
            format!("{fence}{code}{fence}")
        }
    }
}

fn contains_run(code: &str, len: usize) -> bool {
    let mut run = 0;
    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        if c == CodeSpan::TICK {
            run += 1;
            if chars.peek() != Some(&CodeSpan::TICK) && run == len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn close_matches_exact_run() {
        assert_eq!(CodeSpan::close("a``b`", 1), Some(("a``b".to_string(), 5)));
        assert_eq!(CodeSpan::close("x", 1), None);
        assert_eq!(CodeSpan::close(" `a` ``", 2), Some(("`a`".to_string(), 7)));
    }

    #[rstest]
    #[case("x", "`x`")]
    #[case("a`b", "``a`b``")]
    #[case("`tick", "`` `tick ``")]
    #[case("a``b", "`a``b`")]
    fn wrap_code(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(CodeSpan::wrap(code), expected);
    }

    #[test]
    fn wrap_then_close_is_lossless() {
        for code in ["x", "a`b", "`tick", " padded ", "a``b"] {
            let wrapped = CodeSpan::wrap(code);
            let ticks = wrapped.chars().take_while(|&c| c == '`').count();
            let (back, _) = CodeSpan::close(&wrapped[ticks..], ticks).unwrap();
            assert_eq!(back, code);
        }
    }
}
