//! Does plain clipboard text look like markdown?

use std::sync::OnceLock;

use regex::RegexSet;

/// Fenced code, ATX heading, list marker, link and container directive.
const PATTERNS: [&str; 5] = [
    r"(?m)^```",
    r"(?m)^#{1,6}\s+\S",
    r"(?m)^(?:[-*+]|\d+[.)])\s+\S",
    r"\[[^\]]+\]\((?:https?://|/)\S*\)",
    r"(?m)^:::\w",
];

fn patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(PATTERNS).expect("Invalid markdown detection regex"))
}

pub fn looks_like_markdown(text: &str) -> bool {
    patterns().is_match(text)
}
