use crate::models::{Attrs, Fragment, Mark, Node, Slice, TextRun};
use crate::registry::Registry;

use super::{CommandError, CommandResult, InlineRange, Transaction, reject, textblocks_in};

pub(super) fn toggle_mark(tr: &mut Transaction, registry: &Registry, name: &str, attrs: &Attrs) -> CommandResult {
    let selection = tr.selection();
    if selection.is_node() {
        return reject("node selection");
    }
    if selection.is_empty() {
        return reject("empty selection");
    }
    let ty = registry
        .mark_type(name)
        .ok_or_else(|| CommandError::UnknownKind(name.to_string()))?
        .clone();
    let mark = Mark::new(ty.clone(), ty.compute_attrs(Some(attrs))?);

    let doc = tr.doc().clone();
    let ranges: Vec<InlineRange<'_>> = textblocks_in(&doc, selection.from(), selection.to(&doc))
        .into_iter()
        .filter(|r| r.block.ty().allows_marks())
        .collect();
    let mut runs = ranges.iter().flat_map(selected_runs).peekable();
    if runs.peek().is_none() {
        return reject("no markable text in selection");
    }
    let remove = runs.all(|run| run.has_mark(&ty));

    rewrite_runs(tr, &ranges, |run| {
        if remove {
            run.remove_mark(&ty)
        } else {
            run.add_mark(&mark)
        }
    })
}

pub(super) fn clear_format(tr: &mut Transaction) -> CommandResult {
    let selection = tr.selection();
    if selection.is_node() || selection.is_empty() {
        return reject("nothing selected");
    }
    let doc = tr.doc().clone();
    let ranges = textblocks_in(&doc, selection.from(), selection.to(&doc));
    if !ranges
        .iter()
        .flat_map(selected_runs)
        .any(|run| !run.marks().is_empty())
    {
        return reject("no marks in selection");
    }
    rewrite_runs(tr, &ranges, |run| run.with_marks(Vec::new()))
}

fn selected_runs(range: &InlineRange<'_>) -> Vec<TextRun> {
    range
        .block
        .content()
        .cut(range.from, range.to)
        .iter()
        .filter_map(|node| node.as_text().cloned())
        .collect()
}

/// Rewrite the selected text of every range in place. Sizes do not change,
/// so the selection maps through unchanged.
fn rewrite_runs(tr: &mut Transaction, ranges: &[InlineRange<'_>], f: impl Fn(&TextRun) -> TextRun) -> CommandResult {
    let mut changed = false;
    for range in ranges.iter().rev() {
        let content = range.block.content();
        let mut nodes = content.cut(0, range.from).into_vec();
        nodes.extend(content.cut(range.from, range.to).iter().map(|node| match node {
            Node::Text(run) => Node::Text(f(run)),
            other => other.clone(),
        }));
        nodes.extend(content.cut(range.to, content.size()).into_vec());
        let rewritten = Fragment::from_vec(nodes);
        if &rewritten == content {
            continue;
        }
        let start = range.pos + 1;
        tr.replace(start, start + content.size(), Slice::closed(rewritten))?;
        changed = true;
    }
    if changed { Ok(()) } else { reject("nothing to change") }
}
