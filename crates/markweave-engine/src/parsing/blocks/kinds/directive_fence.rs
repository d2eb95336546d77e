use markweave_syntax::{DirectiveAttr, parse_attributes};

/// What a line starting with colons turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveLine {
    /// `:::name{...}` opens a container.
    Open {
        colons: usize,
        name: String,
        attrs: Vec<DirectiveAttr>,
    },
    /// `:::` alone closes the innermost container with at most as many colons.
    Close { colons: usize },
    /// `::name{...}` alone on a line.
    Leaf {
        name: String,
        attrs: Vec<DirectiveAttr>,
    },
}

/// Directive syntax shared by the block and inline parsers.
pub struct DirectiveFence;

impl DirectiveFence {
    pub const COLON: char = ':';
    /// Leaf and text directives.
    pub const LEAF_COLONS: usize = 2;
    pub const CONTAINER_COLONS: usize = 3;

    /// Name and optional attribute list at the start of `s`, which begins
    /// right after the colons. Returns the bytes consumed.
    pub fn head(s: &str) -> Option<(String, Vec<DirectiveAttr>, usize)> {
        let mut chars = s.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() => {}
            _ => return None,
        }
        let name_len = s
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
            .map_or(s.len(), |(i, _)| i);
        let name = s[..name_len].to_string();
        let rest = &s[name_len..];
        if rest.starts_with('{') {
            let (attrs, used) = parse_attributes(rest)?;
            Some((name, attrs, name_len + used))
        } else {
            Some((name, Vec::new(), name_len))
        }
    }

    pub fn classify(text: &str) -> Option<DirectiveLine> {
        let colons = text.chars().take_while(|&c| c == Self::COLON).count();
        let rest = &text[colons..];
        if colons >= Self::CONTAINER_COLONS {
            if rest.trim().is_empty() {
                return Some(DirectiveLine::Close { colons });
            }
            let (name, attrs, used) = Self::head(rest)?;
            rest[used..]
                .trim()
                .is_empty()
                .then_some(DirectiveLine::Open { colons, name, attrs })
        } else if colons == Self::LEAF_COLONS {
            let (name, attrs, used) = Self::head(rest)?;
            rest[used..]
                .trim()
                .is_empty()
                .then_some(DirectiveLine::Leaf { name, attrs })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn container_open_and_close() {
        assert_eq!(
            DirectiveFence::classify(":::mermaid"),
            Some(DirectiveLine::Open {
                colons: 3,
                name: "mermaid".into(),
                attrs: vec![],
            })
        );
        assert_eq!(
            DirectiveFence::classify("::::"),
            Some(DirectiveLine::Close { colons: 4 })
        );
    }

    #[test]
    fn leaf_with_json_attribute() {
        let line = DirectiveFence::classify(r#"::agent{agent={"id":"a1","name":"Ada"}}"#);
        let Some(DirectiveLine::Leaf { name, attrs }) = line else {
            panic!("expected leaf directive, got {line:?}");
        };
        assert_eq!(name, "agent");
        assert_eq!(attrs[0].value, r#"{"id":"a1","name":"Ada"}"#);
    }

    #[test]
    fn trailing_text_is_not_a_directive() {
        assert_eq!(DirectiveFence::classify("::metric{a=1} and more"), None);
        assert_eq!(DirectiveFence::classify(":single"), None);
        assert_eq!(DirectiveFence::classify("::9lives"), None);
    }

    #[test]
    fn head_reports_consumed_bytes() {
        let (name, attrs, used) = DirectiveFence::head("metric{x=1} rest").unwrap();
        assert_eq!((name.as_str(), attrs.len(), used), ("metric", 1, 11));
    }
}
