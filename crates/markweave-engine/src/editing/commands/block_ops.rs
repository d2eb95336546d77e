//! Whole-block operations behind the drag handle, its menu and the plus
//! button.

use std::sync::Arc;

use serde_json::Value;

use crate::models::{Attrs, Element, Fragment, Node};
use crate::registry::Registry;

use super::content::delete_blocks;
use super::{CommandError, CommandResult, Selection, Transaction, empty_paragraph, reject, select_near};

fn block_at(doc: &Element, pos: usize) -> Result<Arc<Element>, CommandError> {
    match doc.resolve(pos)?.node_after() {
        Some(Node::Element(el)) if el.ty().is_block() => Ok(el),
        _ => reject("no block at position"),
    }
}

pub(super) fn toggle_task(tr: &mut Transaction, pos: usize) -> CommandResult {
    let item = block_at(tr.doc(), pos)?;
    let Some(Value::Bool(checked)) = item.attr("checked") else {
        return reject("not a task item");
    };
    let mut attrs = Attrs::new();
    attrs.insert("checked".to_string(), Value::Bool(!checked));
    tr.set_node_attrs(pos, attrs)?;
    Ok(())
}

pub(super) fn delete_block(tr: &mut Transaction, registry: &Registry, pos: usize) -> CommandResult {
    let block = block_at(tr.doc(), pos)?;
    delete_blocks(tr, registry, pos, pos + block.node_size())
}

pub(super) fn duplicate_block(tr: &mut Transaction, pos: usize) -> CommandResult {
    let block = block_at(tr.doc(), pos)?;
    let end = pos + block.node_size();
    tr.insert(end, Fragment::from_node(Node::Element(block)))?;
    Ok(())
}

pub(super) fn insert_paragraph_after(tr: &mut Transaction, registry: &Registry, pos: usize) -> CommandResult {
    let block = block_at(tr.doc(), pos)?;
    let end = pos + block.node_size();
    tr.insert(end, Fragment::from_node(empty_paragraph(registry)))?;
    tr.set_selection(Selection::cursor(end + 1));
    Ok(())
}

/// Append an empty paragraph unless the document already ends with one,
/// then put the cursor at the end.
pub(super) fn ensure_trailing_paragraph(tr: &mut Transaction, registry: &Registry) -> CommandResult {
    let ends_empty = matches!(
        tr.doc().content().last_child(),
        Some(Node::Element(el)) if el.ty() == registry.paragraph_type() && el.content().size() == 0
    );
    if !ends_empty {
        let end = tr.doc().content().size();
        tr.insert(end, Fragment::from_node(empty_paragraph(registry)))?;
    }
    let end = tr.doc().content().size();
    select_near(tr, end, -1);
    Ok(())
}

/// Where `[from, to)` lands when dropped at `target` (given before the
/// move), or `None` for a drop inside the range or on its edges.
pub fn drop_position(from: usize, to: usize, target: usize) -> Option<usize> {
    if target >= from && target <= to {
        None
    } else if target > to {
        Some(target - (to - from))
    } else {
        Some(target)
    }
}

pub(super) fn move_range(tr: &mut Transaction, from: usize, to: usize, target: usize) -> CommandResult {
    if from >= to {
        return reject("empty range");
    }
    let Some(dest) = drop_position(from, to, target) else {
        return reject("drop inside the moved range");
    };
    let slice = tr.doc().slice(from, to)?;
    let moved_atom = slice.open_start == 0
        && slice.content.child_count() == 1
        && slice.content.first_child().is_some_and(Node::is_atom);
    tr.delete(from, to)?;
    tr.replace(dest, dest, slice)?;
    if moved_atom && let Some(selection) = Selection::node(tr.doc(), dest) {
        tr.set_selection(selection);
    } else {
        select_near(tr, dest + 1, 1);
    }
    Ok(())
}
