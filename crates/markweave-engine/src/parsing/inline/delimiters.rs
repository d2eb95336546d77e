//! Delimiter stack processing for emphasis, strong and strikethrough.
//!
//! The inline scanner leaves delimiter runs in the item list untouched; once a
//! span of items is complete (a link's text, or the whole block) the runs are
//! matched closer-first, looking back for the nearest compatible opener.

use crate::parsing::ast::{MdKind, MdNode};

use super::kinds::Emphasis;

#[derive(Debug, Clone, PartialEq)]
pub struct Delim {
    pub ch: char,
    /// Unmatched chars left in the run.
    pub count: usize,
    /// Length of the run as written, for the rule of three.
    pub orig: usize,
    pub can_open: bool,
    pub can_close: bool,
}

/// Intermediate inline item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(MdNode),
    Text(String),
    Delim(Delim),
    /// An unmatched `[`; inactive once it can no longer start a link.
    Bracket { active: bool },
}

/// Resolve every delimiter run in `items` and return finished nodes.
pub fn resolve(mut items: Vec<Item>) -> Vec<MdNode> {
    let mut closer = 0;
    while closer < items.len() {
        let Some(close) = as_closer(&items[closer]) else {
            closer += 1;
            continue;
        };
        let Some(opener) = find_opener(&items, closer, &close) else {
            if let Item::Delim(d) = &mut items[closer]
                && !d.can_open
            {
                d.can_close = false;
            }
            closer += 1;
            continue;
        };
        closer = wrap(&mut items, opener, closer);
    }
    into_nodes(items)
}

fn as_closer(item: &Item) -> Option<Delim> {
    match item {
        Item::Delim(d) if d.can_close && d.count > 0 => Some(d.clone()),
        _ => None,
    }
}

fn find_opener(items: &[Item], closer: usize, close: &Delim) -> Option<usize> {
    (0..closer).rev().find(|&i| {
        let Item::Delim(open) = &items[i] else {
            return false;
        };
        if open.ch != close.ch || !open.can_open || open.count == 0 {
            return false;
        }
        if close.ch == Emphasis::TILDE {
            return open.count == close.count;
        }
        let odd_match = (open.can_close || close.can_open)
            && (open.orig + close.orig) % 3 == 0
            && !(open.orig % 3 == 0 && close.orig % 3 == 0);
        !odd_match
    })
}

/// Wrap the items between `opener` and `closer` in a new node. Returns the
/// index to continue scanning from.
fn wrap(items: &mut Vec<Item>, opener: usize, closer: usize) -> usize {
    let (open_count, close_count, ch) = match (&items[opener], &items[closer]) {
        (Item::Delim(o), Item::Delim(c)) => (o.count, c.count, c.ch),
        _ => return closer + 1,
    };
    let (used, kind) = if ch == Emphasis::TILDE {
        (Emphasis::STRIKE_RUN, MdKind::Delete)
    } else if open_count >= 2 && close_count >= 2 {
        (2, MdKind::Strong)
    } else {
        (1, MdKind::Emphasis)
    };

    let inner: Vec<Item> = items.drain(opener + 1..closer).collect();
    let node = MdNode::new(kind, into_nodes(inner));
    items.insert(opener + 1, Item::Node(node));

    let mut closer = opener + 2;
    if let Item::Delim(c) = &mut items[closer] {
        c.count = c.count.saturating_sub(used);
    }
    if let Item::Delim(o) = &mut items[opener] {
        o.count = o.count.saturating_sub(used);
        if o.count == 0 {
            items.remove(opener);
            closer -= 1;
        }
    }
    if matches!(&items[closer], Item::Delim(c) if c.count == 0) {
        items.remove(closer);
    }
    closer
}

/// Turn leftover delimiters and brackets into text and merge adjacent text.
pub fn into_nodes(items: Vec<Item>) -> Vec<MdNode> {
    let mut out: Vec<MdNode> = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Item::Node(node) => {
                out.push(node);
                continue;
            }
            Item::Text(text) => text,
            Item::Delim(d) => d.ch.to_string().repeat(d.count),
            Item::Bracket { .. } => "[".to_string(),
        };
        if text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(MdNode {
                kind: MdKind::Text(prev),
                ..
            }) => prev.push_str(&text),
            _ => out.push(MdNode::text(text)),
        }
    }
    out
}
