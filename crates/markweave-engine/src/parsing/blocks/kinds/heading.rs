/// ATX heading: one to six `#` followed by a space or the end of the line.
pub struct AtxHeading;

impl AtxHeading {
    pub const MARKER: char = '#';
    pub const MAX_LEVEL: u8 = 6;

    /// Returns the level and the heading text with any closing sequence
    /// removed.
    pub fn parse(text: &str) -> Option<(u8, &str)> {
        let level = text.chars().take_while(|&c| c == Self::MARKER).count();
        if level == 0 || level > usize::from(Self::MAX_LEVEL) {
            return None;
        }
        let rest = &text[level..];
        if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
            return None;
        }
        let mut content = rest.trim();
        // Optional closing sequence: whitespace then only `#`
        let stripped = content.trim_end_matches(Self::MARKER);
        if stripped.is_empty() {
            content = stripped;
        } else if stripped.len() != content.len() && stripped.ends_with([' ', '\t']) {
            content = stripped.trim_end();
        }
        Some((level as u8, content))
    }

    pub fn prefix(level: u8) -> String {
        Self::MARKER.to_string().repeat(level as usize)
    }
}
