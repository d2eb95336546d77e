/// An opening or closing code fence: which character and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceSig {
    pub ch: char,
    pub len: usize,
    /// Info string after an opening fence, trimmed.
    pub info: String,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICK: char = '`';
    pub const TILDE: char = '~';
    pub const MIN_LEN: usize = 3;

    pub fn sig(text: &str) -> Option<FenceSig> {
        let ch = text.chars().next()?;
        if ch != Self::BACKTICK && ch != Self::TILDE {
            return None;
        }
        let len = text.chars().take_while(|&c| c == ch).count();
        if len < Self::MIN_LEN {
            return None;
        }
        let info = text[len..].trim();
        // Backtick fences cannot carry backticks in their info string
        if ch == Self::BACKTICK && info.contains(Self::BACKTICK) {
            return None;
        }
        Some(FenceSig {
            ch,
            len,
            info: info.to_string(),
        })
    }

    /// Whether `text` closes a fence opened with `open`.
    pub fn closes(open: &FenceSig, text: &str) -> bool {
        match Self::sig(text) {
            Some(sig) => sig.ch == open.ch && sig.len >= open.len && sig.info.is_empty(),
            None => false,
        }
    }

    /// Language from an info string: its first word.
    pub fn language(info: &str) -> Option<String> {
        info.split_whitespace().next().map(str::to_string)
    }

    /// A backtick fence longer than any backtick run in `code`.
    pub fn fence_for(code: &str) -> String {
        let mut longest = 0;
        let mut run = 0;
        for c in code.chars() {
            if c == Self::BACKTICK {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        Self::BACKTICK
            .to_string()
            .repeat((longest + 1).max(Self::MIN_LEN))
    }
}
