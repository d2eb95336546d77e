use std::fmt;

use super::node::{Element, Node};

/// An ordered run of sibling nodes with a cached position size.
///
/// Adjacent text runs with identical marks are always merged and empty text
/// runs are dropped, so two fragments describing the same content compare
/// equal.
#[derive(Clone, PartialEq, Default)]
pub struct Fragment {
    content: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_vec(vec![node])
    }

    pub fn from_vec(nodes: Vec<Node>) -> Self {
        let mut content: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut size = 0;
        for node in nodes {
            if let Node::Text(run) = &node {
                if run.is_empty() {
                    continue;
                }
                if let Some(Node::Text(prev)) = content.last_mut()
                    && prev.marks() == run.marks()
                {
                    size += run.len();
                    *prev = prev.with_text(format!("{}{}", prev.text(), run.text()));
                    continue;
                }
            }
            size += node.node_size();
            content.push(node);
        }
        Self { content, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Panics on an out-of-range index, like slice indexing.
    pub fn child(&self, index: usize) -> &Node {
        &self.content[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.content
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.content
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.content.clone();
        nodes.extend(other.content.iter().cloned());
        Self::from_vec(nodes)
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        let mut nodes = Vec::with_capacity(self.content.len() + 1);
        nodes.push(node);
        nodes.extend(self.content.iter().cloned());
        Self::from_vec(nodes)
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        let mut nodes = self.content.clone();
        nodes.push(node);
        Self::from_vec(nodes)
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.content.clone();
        nodes[index] = node;
        Self::from_vec(nodes)
    }

    pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.content.len() {
            return self.clone();
        }
        Self::from_vec(self.content[from..to].to_vec())
    }

    /// Content between two positions, cutting partially covered children.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in &self.content {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let child = if pos < from || end > to {
                        match child {
                            Node::Text(run) => {
                                Node::Text(run.cut(from.saturating_sub(pos), (to - pos).min(run.len())))
                            }
                            Node::Element(el) => {
                                let inner = el.content().size();
                                child.cut(
                                    from.saturating_sub(pos + 1),
                                    (to.saturating_sub(pos + 1)).min(inner),
                                )
                            }
                        }
                    } else {
                        child.clone()
                    };
                    result.push(child);
                }
                pos = end;
            }
        }
        Self::from_vec(result)
    }

    /// Index of the child containing `pos` and that child's start offset.
    ///
    /// A position on a boundary resolves to the child after it; `round > 0`
    /// pushes a position inside a child to the next boundary.
    pub fn find_index(&self, pos: usize, round: i32) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }
        if pos >= self.size {
            return (self.content.len(), self.size);
        }
        let mut cur = 0;
        for (i, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round > 0 {
                    return (i + 1, end);
                }
                return (i, cur);
            }
            cur = end;
        }
        (self.content.len(), self.size)
    }

    /// Visit every node overlapping `[from, to)`, depth first. Returning
    /// `false` from `f` skips the node's children. `f` receives the node, its
    /// absolute position, its parent (if inside an element) and its index.
    pub fn nodes_between<'a>(
        &'a self,
        from: usize,
        to: usize,
        node_start: usize,
        parent: Option<&'a Element>,
        f: &mut dyn FnMut(&'a Node, usize, Option<&'a Element>, usize) -> bool,
    ) {
        let mut pos = 0;
        for (i, child) in self.content.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) {
                if let Node::Element(el) = child
                    && el.content().size() > 0
                {
                    let start = pos + 1;
                    el.content().nodes_between(
                        from.saturating_sub(start),
                        (to - start).min(el.content().size()),
                        node_start + start,
                        Some(el),
                        f,
                    );
                }
            }
            pos = end;
        }
    }

    /// Visit every descendant.
    pub fn descendants<'a>(
        &'a self,
        f: &mut dyn FnMut(&'a Node, usize, Option<&'a Element>, usize) -> bool,
    ) {
        self.nodes_between(0, self.size, 0, None, f)
    }

    /// Plain text in a range. Textblocks (and block leaves that contribute
    /// text) are joined with `block_separator`; inline leaves contribute their
    /// leaf text, e.g. a hard break yields `"\n"`.
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, 0, None, &mut |node, pos, _, _| {
            let node_text = match node {
                Node::Text(run) => {
                    let start = from.max(pos) - pos;
                    let end = (to - pos).min(run.len());
                    run.cut(start, end).text().to_string()
                }
                Node::Element(el) if el.ty().is_leaf() => {
                    el.ty().spec().leaf_text.clone().unwrap_or_default()
                }
                Node::Element(_) => String::new(),
            };
            let block_with_text =
                node.is_block() && ((node.is_leaf() && !node_text.is_empty()) || node.is_textblock());
            if block_with_text && !block_separator.is_empty() {
                if first {
                    first = false;
                } else {
                    text.push_str(block_separator);
                }
            }
            text.push_str(&node_text);
            true
        });
        text
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

impl FromIterator<Node> for Fragment {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.content.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn adjacent_text_with_same_marks_merges() {
        let b = builder();
        let para = b.p(vec![b.text("ab"), b.text("cd"), b.marked("ef", &["bold"])]);
        let content = para.content().unwrap();
        assert_eq!(content.child_count(), 2);
        assert_eq!(content.size(), 6);
        assert_eq!(content.child(0).text_content(), "abcd");
    }

    #[test]
    fn empty_text_is_dropped() {
        let b = builder();
        let para = b.p(vec![b.text(""), b.text("x")]);
        assert_eq!(para.content().unwrap().child_count(), 1);
    }

    #[rstest]
    #[case(0, 0, (0, 0))]
    #[case(1, -1, (0, 0))]
    #[case(5, -1, (1, 5))]
    #[case(6, -1, (1, 5))]
    #[case(6, 1, (2, 10))]
    #[case(10, -1, (2, 10))]
    fn find_index_positions(#[case] pos: usize, #[case] round: i32, #[case] expected: (usize, usize)) {
        let b = builder();
        // two paragraphs of size 5 ("abc" + 2)
        let doc = b.doc(vec![b.p(vec![b.text("abc")]), b.p(vec![b.text("def")])]);
        assert_eq!(doc.content().find_index(pos, round), expected);
    }

    #[test]
    fn cut_trims_partial_children() {
        let b = builder();
        let doc = b.doc(vec![b.p(vec![b.text("hello")]), b.p(vec![b.text("world")])]);
        let cut = doc.content().cut(3, 10);
        assert_eq!(cut.child_count(), 2);
        assert_eq!(cut.child(0).text_content(), "llo");
        assert_eq!(cut.child(1).text_content(), "wo");
    }

    #[test]
    fn text_between_joins_blocks_and_hard_breaks() {
        let b = builder();
        let doc = b.doc(vec![
            b.h(1, vec![b.text("Title")]),
            b.hr(),
            b.p(vec![b.text("one"), b.br(), b.text("two")]),
        ]);
        let size = doc.content().size();
        assert_eq!(doc.content().text_between(0, size, "\n\n"), "Title\n\none\ntwo");
    }

    #[test]
    fn nodes_between_reports_positions_and_parents() {
        let b = builder();
        let doc = b.doc(vec![b.ul(vec![b.li(vec![b.p(vec![b.text("x")])])])]);
        let mut seen = Vec::new();
        doc.content().descendants(&mut |node, pos, parent, _| {
            let parent = parent.map(|p| p.kind_name().to_string()).unwrap_or_default();
            seen.push(format!("{}@{pos}<{parent}", node.kind_name()));
            true
        });
        assert_eq!(
            seen,
            vec!["bulletList@0<", "listItem@1<bulletList", "paragraph@2<listItem", "text@3<paragraph"]
        );
    }
}
