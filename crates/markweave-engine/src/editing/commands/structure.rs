//! Commands that reshape blocks without touching their text: retyping,
//! wrapping, lifting and list kind swaps.

use tracing::debug;

use crate::models::{Attrs, BlockRange, Element, Fragment, Node, NodeType, Role, Slice};
use crate::registry::Registry;

use super::{CommandError, CommandResult, SelectionPoints, Transaction, fit_inline, node_type, reject, textblocks_in};

pub(super) fn set_block_type(tr: &mut Transaction, registry: &Registry, name: &str, attrs: &Attrs) -> CommandResult {
    let target = node_type(registry, name)?.clone();
    if !target.is_textblock() {
        return reject("target kind is not a textblock");
    }
    let attrs = target.compute_attrs(Some(attrs))?;
    let selection = tr.selection();
    if selection.is_node() {
        return reject("node selection");
    }

    let doc = tr.doc().clone();
    let points = SelectionPoints::capture(&doc, selection);
    let mut changed = false;
    for range in textblocks_in(&doc, selection.from(), selection.to(&doc)).iter().rev() {
        let block = range.block;
        if block.has_markup(&target, &attrs) {
            continue;
        }
        let content = fit_inline(registry, block.content(), &target);
        if !target.valid_content(&content) {
            debug!(kind = block.kind_name(), target = target.name(), "content does not fit new block type");
            continue;
        }
        let rp = doc.resolve(range.pos)?;
        let parent = rp.parent();
        let replacement = Element::new(target.clone(), attrs.clone(), content).into_node();
        let siblings = parent
            .content()
            .replace_child(rp.index(rp.depth()), replacement.clone());
        if !parent.ty().valid_content(&siblings) {
            debug!(parent = parent.kind_name(), target = target.name(), "parent rejects block type");
            continue;
        }
        tr.replace_with(range.pos, range.pos + block.node_size(), replacement)?;
        changed = true;
    }
    if !changed {
        return reject("no block changed");
    }
    points.restore(tr);
    Ok(())
}

pub(super) fn wrap_in(tr: &mut Transaction, registry: &Registry, name: &str, attrs: &Attrs) -> CommandResult {
    let wrapper_ty = node_type(registry, name)?.clone();
    let attrs = wrapper_ty.compute_attrs(Some(attrs))?;
    let doc = tr.doc().clone();
    let selection = tr.selection();
    if selection.is_node() {
        return reject("node selection");
    }
    let points = SelectionPoints::capture(&doc, selection);
    let rfrom = doc.resolve(selection.from())?;
    let rto = doc.resolve(selection.to(&doc))?;
    let Some(range) = rfrom.block_range(&rto, None) else {
        return reject("no block range to wrap");
    };
    let parent = range.parent();
    let blocks: Vec<Node> = (range.start_index()..range.end_index())
        .map(|i| parent.child(i).clone())
        .collect();

    let content = if wrapper_ty.role() == Role::List {
        let item_ty = list_item_type(registry, &wrapper_ty)?;
        let item_attrs = item_ty.compute_attrs(None)?;
        blocks
            .into_iter()
            .map(|block| {
                let content = Fragment::from_node(block);
                if item_ty.valid_content(&content) {
                    Ok(Element::new(item_ty.clone(), item_attrs.clone(), content).into_node())
                } else {
                    reject("block cannot become a list item")
                }
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        blocks
    };
    let wrapper = Element::new(wrapper_ty, attrs, Fragment::from_vec(content));
    if !wrapper.ty().valid_content(wrapper.content()) {
        return reject("wrapper rejects the blocks");
    }
    let siblings = parent
        .content()
        .cut_by_index(0, range.start_index())
        .add_to_end(wrapper.clone().into_node())
        .append(&parent.content().cut_by_index(range.end_index(), parent.child_count()));
    if !parent.ty().valid_content(&siblings) {
        return reject("parent rejects the wrapper");
    }
    tr.replace_with(range.start(), range.end(), wrapper.into_node())?;
    points.restore(tr);
    Ok(())
}

pub(super) fn lift(tr: &mut Transaction) -> CommandResult {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let points = SelectionPoints::capture(&doc, selection);
    let rfrom = doc.resolve(selection.from())?;
    let rto = doc.resolve(selection.to(&doc))?;
    let Some(range) = rfrom.block_range(&rto, None) else {
        return reject("no block range to lift");
    };
    if range.depth == 0 {
        return reject("nothing to lift out of");
    }
    match range.parent().ty().role() {
        Role::List => lift_range(tr, &range, true)?,
        Role::ListItem => {
            let is_list: &dyn Fn(&Element) -> bool = &|el| el.ty().role() == Role::List;
            let Some(list_range) = rfrom.block_range(&rto, Some(is_list)) else {
                return reject("list item outside a list");
            };
            lift_range(tr, &list_range, true)?;
        }
        Role::Plain => lift_range(tr, &range, false)?,
    }
    points.restore(tr);
    Ok(())
}

/// Replace the wrapper around `range` with its untouched siblings (still
/// wrapped) and the lifted blocks. List items are unwrapped one level
/// further so their contents land in the list's parent.
fn lift_range(tr: &mut Transaction, range: &BlockRange<'_>, unwrap_items: bool) -> CommandResult {
    let wrapper = range.parent();
    let (start, end) = (range.start_index(), range.end_index());
    let mut nodes = Vec::new();
    if start > 0 {
        nodes.push(wrapper.copy(wrapper.content().cut_by_index(0, start)).into_node());
    }
    for i in start..end {
        match wrapper.child(i) {
            Node::Element(item) if unwrap_items => nodes.extend(item.content().iter().cloned()),
            child => nodes.push(child.clone()),
        }
    }
    if end < wrapper.child_count() {
        nodes.push(
            wrapper
                .copy(wrapper.content().cut_by_index(end, wrapper.child_count()))
                .into_node(),
        );
    }

    let depth = range.depth;
    let outer = range.from.node(depth - 1);
    let index = range.from.index(depth - 1);
    let siblings = outer
        .content()
        .cut_by_index(0, index)
        .append(&Fragment::from_vec(nodes.clone()))
        .append(&outer.content().cut_by_index(index + 1, outer.child_count()));
    if !outer.ty().valid_content(&siblings) {
        return reject("lifted blocks do not fit the outer node");
    }
    tr.replace(
        range.from.before(depth),
        range.from.after(depth),
        Slice::closed(Fragment::from_vec(nodes)),
    )?;
    Ok(())
}

pub(super) fn toggle_list(tr: &mut Transaction, registry: &Registry, name: &str) -> CommandResult {
    let target = node_type(registry, name)?.clone();
    if target.role() != Role::List {
        return reject("target kind is not a list");
    }
    let doc = tr.doc().clone();
    let selection = tr.selection();
    if selection.is_node() {
        return reject("node selection");
    }
    let rfrom = doc.resolve(selection.from())?;
    let shared = rfrom.shared_depth(selection.to(&doc));
    let Some(depth) = (1..=shared)
        .rev()
        .find(|&d| rfrom.node(d).ty().role() == Role::List)
    else {
        return wrap_in(tr, registry, name, &Attrs::new());
    };
    let list = rfrom.node(depth);
    if list.ty() == &target {
        return lift(tr);
    }

    let points = SelectionPoints::capture(&doc, selection);
    let item_ty = list_item_type(registry, &target)?;
    let items = list
        .content()
        .iter()
        .map(|item| convert_item(item, &item_ty))
        .collect::<Result<Vec<_>, _>>()?;
    let converted = Element::new(target.clone(), target.compute_attrs(None)?, Fragment::from_vec(items));
    tr.replace_with(rfrom.before(depth), rfrom.after(depth), converted.into_node())?;
    points.restore(tr);
    Ok(())
}

/// The item kind a list requires, e.g. `taskItem` for `taskList`.
fn list_item_type(registry: &Registry, list: &NodeType) -> Result<NodeType, CommandError> {
    let Some(name) = list.content().required().first().copied() else {
        return reject("list kind has no item kind");
    };
    Ok(node_type(registry, name)?.clone())
}

/// Re-kind one list item, keeping attributes the new kind gives a non-null
/// default (a task's `checked`), and resetting the rest.
fn convert_item(item: &Node, item_ty: &NodeType) -> Result<Node, CommandError> {
    let Node::Element(item) = item else {
        return reject("text inside a list");
    };
    let mut attrs = item_ty.compute_attrs(None)?;
    for (key, value) in attrs.iter_mut() {
        if let Some(old) = item.attr(key)
            && !value.is_null()
            && !old.is_null()
        {
            *value = old.clone();
        }
    }
    if !item_ty.valid_content(item.content()) {
        return reject("item content does not fit the new item kind");
    }
    Ok(Element::new(item_ty.clone(), attrs, item.content().clone()).into_node())
}
