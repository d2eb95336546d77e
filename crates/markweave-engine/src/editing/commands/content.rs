use crate::models::{Attrs, Element, Fragment, Node, NodeType, ResolvedPos, Role, Slice};
use crate::registry::Registry;

use super::structure::lift;
use super::{
    CommandResult, Selection, Transaction, empty_paragraph, fit_inline, reject, select_near, text_with_breaks,
};

pub(super) fn delete_selection(tr: &mut Transaction, registry: &Registry) -> CommandResult {
    let selection = tr.selection();
    if selection.is_empty() {
        return reject("empty selection");
    }
    let (from, to) = (selection.from(), selection.to(tr.doc()));
    if selection.is_node() {
        return delete_blocks(tr, registry, from, to);
    }
    delete_range(tr, registry, from, to)
}

/// Delete a text range, falling back to the whole blocks that cover it when
/// the two sides cannot be joined.
pub(super) fn delete_range(tr: &mut Transaction, registry: &Registry, from: usize, to: usize) -> CommandResult {
    if tr.delete(from, to).is_ok() {
        return Ok(());
    }
    let doc = tr.doc().clone();
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let Some(range) = rfrom.block_range(&rto, None) else {
        return reject("no blocks cover the selection");
    };
    delete_blocks(tr, registry, range.start(), range.end())
}

/// Delete whole sibling blocks. A container left invalid gets an empty
/// paragraph instead, or is deleted itself when it cannot hold one.
pub(super) fn delete_blocks(tr: &mut Transaction, registry: &Registry, start: usize, end: usize) -> CommandResult {
    if tr.delete(start, end).is_ok() {
        return Ok(());
    }
    if tr.replace_with(start, end, empty_paragraph(registry)).is_ok() {
        select_near(tr, start + 1, 1);
        return Ok(());
    }
    let doc = tr.doc().clone();
    let rp = doc.resolve(start)?;
    let depth = rp.depth();
    if depth == 0 {
        return reject("document cannot be emptied");
    }
    delete_blocks(tr, registry, rp.before(depth), rp.after(depth))
}

pub(super) fn split_block(tr: &mut Transaction, registry: &Registry) -> CommandResult {
    let selection = tr.selection();
    if selection.is_node() {
        return reject("node selection");
    }
    if !selection.is_empty() {
        let to = selection.to(tr.doc());
        delete_range(tr, registry, selection.from(), to)?;
    }

    let doc = tr.doc().clone();
    let pos = tr.selection().head();
    let rp = doc.resolve(pos)?;
    let block = rp.parent();
    if !block.is_textblock() {
        return reject("cursor is not in a textblock");
    }
    if block.ty().is_code() {
        tr.insert(pos, Fragment::from_node(Node::text("\n", Vec::new())))?;
        tr.set_selection(Selection::cursor(pos + 1));
        return Ok(());
    }

    let depth = rp.depth();
    let in_item = depth >= 2 && rp.node(depth - 1).ty().role() == Role::ListItem;
    if in_item && block.content().size() == 0 {
        return lift(tr);
    }
    let after_block = if rp.parent_offset() == block.content().size() {
        (registry.paragraph_type().clone(), Attrs::new())
    } else {
        (block.ty().clone(), block.attrs().clone())
    };
    let mut after = vec![after_block];
    if in_item {
        let item = rp.node(depth - 1);
        after.push((item.ty().clone(), item.ty().compute_attrs(None)?));
    }
    let levels = after.len();
    split(tr, &rp, after)?;
    tr.set_selection(Selection::cursor(pos + 2 * levels));
    Ok(())
}

/// Split the ancestors of `rp`, innermost first, one level per entry in
/// `after`; each entry gives the kind and attributes of the new right half.
pub(super) fn split(tr: &mut Transaction, rp: &ResolvedPos<'_>, after: Vec<(NodeType, Attrs)>) -> CommandResult {
    let levels = after.len();
    if levels == 0 || levels > rp.depth() {
        return reject("cannot split that deep");
    }
    let mut before = Fragment::empty();
    let mut right = Fragment::empty();
    for (i, (ty, attrs)) in after.into_iter().enumerate() {
        let node = rp.node(rp.depth() - i);
        before = Fragment::from_node(node.copy(before).into_node());
        right = Fragment::from_node(Element::new(ty, attrs, right).into_node());
    }
    tr.replace(rp.pos(), rp.pos(), Slice::new(before.append(&right), levels, levels))?;
    Ok(())
}

pub(super) fn insert_text(tr: &mut Transaction, registry: &Registry, text: &str) -> CommandResult {
    if text.is_empty() {
        return reject("no text");
    }
    let selection = tr.selection();
    if !selection.is_empty() {
        let to = selection.to(tr.doc());
        let from = selection.from();
        if selection.is_node() {
            delete_blocks(tr, registry, from, to)?;
        } else {
            delete_range(tr, registry, from, to)?;
        }
    }

    let doc = tr.doc().clone();
    let pos = tr.selection().head();
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    if !parent.is_textblock() {
        return reject("cursor is not in a textblock");
    }
    if !parent.ty().is_code() && text.contains("\n\n") {
        let paragraphs: Vec<Node> = text
            .split("\n\n")
            .filter(|chunk| !chunk.trim().is_empty())
            .map(|chunk| {
                let content = Fragment::from_vec(text_with_breaks(registry, chunk, &[]));
                Element::new(registry.paragraph_type().clone(), Attrs::new(), content).into_node()
            })
            .collect();
        return insert_content_at(tr, registry, pos, &Fragment::from_vec(paragraphs));
    }
    let marks = if parent.ty().allows_marks() { rp.marks() } else { Vec::new() };
    let content = fit_inline(
        registry,
        &Fragment::from_node(Node::text(text, marks)),
        parent.ty(),
    );
    tr.insert(pos, content.clone())?;
    tr.set_selection(Selection::cursor(pos + content.size()));
    Ok(())
}

pub(super) fn insert_content_at(tr: &mut Transaction, registry: &Registry, pos: usize, content: &Fragment) -> CommandResult {
    if content.is_empty() {
        return reject("nothing to insert");
    }
    let doc = tr.doc().clone();
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();

    if content.iter().all(Node::is_inline) {
        if !parent.is_textblock() {
            return reject("inline content outside a textblock");
        }
        let fitted = fit_inline(registry, content, parent.ty());
        tr.insert(pos, fitted.clone())?;
        tr.set_selection(Selection::cursor(pos + fitted.size()));
        return Ok(());
    }

    let blocks = wrap_inline_runs(registry, content);
    let at = if parent.is_textblock() {
        let depth = rp.depth();
        let size = parent.content().size();
        if size == 0 {
            let start = rp.before(depth);
            tr.replace(start, rp.after(depth), Slice::closed(blocks.clone()))?;
            select_near(tr, start + blocks.size(), -1);
            return Ok(());
        }
        match rp.parent_offset() {
            0 => rp.before(depth),
            offset if offset == size => rp.after(depth),
            _ => {
                split(tr, &rp, vec![(parent.ty().clone(), parent.attrs().clone())])?;
                pos + 1
            }
        }
    } else {
        pos
    };
    tr.insert(at, blocks.clone())?;
    select_near(tr, at + blocks.size(), -1);
    Ok(())
}

/// Top-level inline runs wrapped into paragraphs so mixed content can be
/// inserted at a block position.
fn wrap_inline_runs(registry: &Registry, content: &Fragment) -> Fragment {
    let mut blocks = Vec::new();
    let mut inline = Vec::new();
    for node in content.iter() {
        if node.is_inline() {
            inline.push(node.clone());
            continue;
        }
        if !inline.is_empty() {
            blocks.push(paragraph_of(registry, std::mem::take(&mut inline)));
        }
        blocks.push(node.clone());
    }
    if !inline.is_empty() {
        blocks.push(paragraph_of(registry, inline));
    }
    Fragment::from_vec(blocks)
}

fn paragraph_of(registry: &Registry, inline: Vec<Node>) -> Node {
    Element::new(registry.paragraph_type().clone(), Attrs::new(), Fragment::from_vec(inline)).into_node()
}

/// Paste: an open slice is joined into the surrounding textblocks when the
/// kinds allow it, otherwise its content is inserted whole.
pub(super) fn replace_selection(tr: &mut Transaction, registry: &Registry, slice: &Slice) -> CommandResult {
    if slice.content.is_empty() {
        return reject("empty slice");
    }
    let selection = tr.selection();
    if !selection.is_empty() {
        let to = selection.to(tr.doc());
        let from = selection.from();
        if selection.is_node() {
            delete_blocks(tr, registry, from, to)?;
        } else {
            delete_range(tr, registry, from, to)?;
        }
    }
    let pos = tr.selection().from();
    let joinable = slice.open_start > 0 || slice.open_end > 0;
    if joinable && tr.replace(pos, pos, slice.clone()).is_ok() {
        select_near(tr, pos + slice.size(), -1);
        return Ok(());
    }
    insert_content_at(tr, registry, pos, &slice.content)
}
