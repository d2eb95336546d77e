//! Named document commands.
//!
//! A [`Command`] is plain data. [`compile`] checks it against a state and,
//! when it applies, returns the transaction that performs it. Commands never
//! touch the state themselves, so a rejected command leaves the document
//! pointer-equal.

mod block_ops;
mod content;
mod marks;
mod structure;

use thiserror::Error;
use tracing::debug;

use crate::models::{AttrError, Attrs, Element, Fragment, Node, NodeType, Slice};
use crate::registry::Registry;

use super::selection::{Selection, TextPoint};
use super::state::EditorState;
use super::step::StepError;
use super::transaction::Transaction;

pub use block_ops::drop_position;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add `mark` to the selected text, or remove it when every selected run
    /// already carries that kind.
    ToggleMark { mark: String, attrs: Attrs },
    /// Remove every mark in the selection.
    ClearFormat,
    SetBlockType { kind: String, attrs: Attrs },
    WrapIn { kind: String, attrs: Attrs },
    /// Wrap in a list, swap the kind of the enclosing list, or lift out of a
    /// list that already has this kind.
    ToggleList { kind: String },
    Lift,
    SplitBlock,
    DeleteSelection,
    /// Type text at the selection.
    InsertText(String),
    InsertContentAt { pos: usize, content: Fragment },
    /// Paste a slice over the selection.
    ReplaceSelection(Slice),
    SetNodeAttr { pos: usize, attrs: Attrs },
    ToggleTask(usize),
    DeleteBlock(usize),
    DuplicateBlock(usize),
    /// Move `[from, to)` to `target`, given in positions before the move.
    Move { from: usize, to: usize, target: usize },
    InsertParagraphAfter(usize),
    EnsureTrailingParagraph,
}

impl Command {
    pub fn toggle_mark(mark: &str) -> Self {
        Command::ToggleMark {
            mark: mark.to_string(),
            attrs: Attrs::new(),
        }
    }

    pub fn set_block_type(kind: &str, attrs: Attrs) -> Self {
        Command::SetBlockType {
            kind: kind.to_string(),
            attrs,
        }
    }

    pub fn heading(level: u8) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert("level".to_string(), level.into());
        Self::set_block_type("heading", attrs)
    }

    pub fn wrap_in(kind: &str) -> Self {
        Command::WrapIn {
            kind: kind.to_string(),
            attrs: Attrs::new(),
        }
    }

    pub fn toggle_list(kind: &str) -> Self {
        Command::ToggleList { kind: kind.to_string() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::ToggleMark { .. } => "toggleMark",
            Command::ClearFormat => "clearFormat",
            Command::SetBlockType { .. } => "setBlockType",
            Command::WrapIn { .. } => "wrapIn",
            Command::ToggleList { .. } => "toggleList",
            Command::Lift => "lift",
            Command::SplitBlock => "splitBlock",
            Command::DeleteSelection => "deleteSelection",
            Command::InsertText(_) => "insertText",
            Command::InsertContentAt { .. } => "insertContentAt",
            Command::ReplaceSelection(_) => "replaceSelection",
            Command::SetNodeAttr { .. } => "setNodeAttr",
            Command::ToggleTask(_) => "toggleTask",
            Command::DeleteBlock(_) => "deleteBlock",
            Command::DuplicateBlock(_) => "duplicateBlock",
            Command::Move { .. } => "move",
            Command::InsertParagraphAfter(_) => "insertParagraphAfter",
            Command::EnsureTrailingParagraph => "ensureTrailingParagraph",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{0}")]
    Rejected(&'static str),

    #[error("unknown kind {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Attr(#[from] AttrError),
}

impl From<crate::models::PositionError> for CommandError {
    fn from(error: crate::models::PositionError) -> Self {
        CommandError::Step(error.into())
    }
}

type CommandResult = Result<(), CommandError>;

/// The transaction performing `command`, or `None` when it does not apply.
pub fn compile(state: &EditorState, command: &Command) -> Option<Transaction> {
    let mut tr = state.tr();
    match run(&mut tr, state.registry(), command) {
        Ok(()) => Some(tr),
        Err(error) => {
            debug!(command = command.name(), %error, "command rejected");
            None
        }
    }
}

/// Append the steps of `command` to `tr`.
pub fn run(tr: &mut Transaction, registry: &Registry, command: &Command) -> CommandResult {
    match command {
        Command::ToggleMark { mark, attrs } => marks::toggle_mark(tr, registry, mark, attrs),
        Command::ClearFormat => marks::clear_format(tr),
        Command::SetBlockType { kind, attrs } => structure::set_block_type(tr, registry, kind, attrs),
        Command::WrapIn { kind, attrs } => structure::wrap_in(tr, registry, kind, attrs),
        Command::ToggleList { kind } => structure::toggle_list(tr, registry, kind),
        Command::Lift => structure::lift(tr),
        Command::SplitBlock => content::split_block(tr, registry),
        Command::DeleteSelection => content::delete_selection(tr, registry),
        Command::InsertText(text) => content::insert_text(tr, registry, text),
        Command::InsertContentAt { pos, content } => content::insert_content_at(tr, registry, *pos, content),
        Command::ReplaceSelection(slice) => content::replace_selection(tr, registry, slice),
        Command::SetNodeAttr { pos, attrs } => {
            tr.set_node_attrs(*pos, attrs.clone())?;
            Ok(())
        }
        Command::ToggleTask(pos) => block_ops::toggle_task(tr, *pos),
        Command::DeleteBlock(pos) => block_ops::delete_block(tr, registry, *pos),
        Command::DuplicateBlock(pos) => block_ops::duplicate_block(tr, *pos),
        Command::Move { from, to, target } => block_ops::move_range(tr, *from, *to, *target),
        Command::InsertParagraphAfter(pos) => block_ops::insert_paragraph_after(tr, registry, *pos),
        Command::EnsureTrailingParagraph => block_ops::ensure_trailing_paragraph(tr, registry),
    }
}

fn reject<T>(reason: &'static str) -> Result<T, CommandError> {
    Err(CommandError::Rejected(reason))
}

fn node_type<'r>(registry: &'r Registry, name: &str) -> Result<&'r NodeType, CommandError> {
    registry
        .node_type(name)
        .ok_or_else(|| CommandError::UnknownKind(name.to_string()))
}

fn empty_paragraph(registry: &Registry) -> Node {
    Element::new(registry.paragraph_type().clone(), Attrs::new(), Fragment::empty()).into_node()
}

/// Put a cursor at the valid position nearest `pos` in the current document.
fn select_near(tr: &mut Transaction, pos: usize, bias: i32) {
    let selection = match tr.doc().resolve(pos.min(tr.doc().content().size())) {
        Ok(rp) => Selection::near(&rp, bias),
        Err(_) => return,
    };
    tr.set_selection(selection);
}

/// Text in `text` with newlines turned into hard breaks, or spaces when the
/// registry has no hard break kind.
fn text_with_breaks(registry: &Registry, text: &str, marks: &[crate::models::Mark]) -> Vec<Node> {
    let hard_break = registry
        .node_type("hardBreak")
        .and_then(|ty| Some(Element::new(ty.clone(), ty.compute_attrs(None).ok()?, Fragment::empty())));
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            match &hard_break {
                Some(br) => nodes.push(br.clone().into_node()),
                None => nodes.push(Node::text(" ", marks.to_vec())),
            }
        }
        nodes.push(Node::text(line, marks.to_vec()));
    }
    nodes
}

/// Inline content reshaped for a textblock kind: code takes only plain text
/// (leaf atoms contribute their leaf text), other kinds drop marks they do
/// not allow.
fn fit_inline(registry: &Registry, content: &Fragment, target: &NodeType) -> Fragment {
    let mut nodes = Vec::with_capacity(content.child_count());
    for child in content.iter() {
        match child {
            Node::Text(run) if target.is_code() => nodes.push(Node::text(run.text(), Vec::new())),
            Node::Text(run) if !target.allows_marks() => nodes.push(Node::Text(run.with_marks(Vec::new()))),
            Node::Text(run) if run.text().contains('\n') => {
                nodes.extend(text_with_breaks(registry, run.text(), run.marks()));
            }
            Node::Element(el) if target.is_code() => match &el.ty().spec().leaf_text {
                Some(text) => nodes.push(Node::text(text.as_str(), Vec::new())),
                None => debug!(kind = el.kind_name(), "inline node dropped from code"),
            },
            other => nodes.push(other.clone()),
        }
    }
    Fragment::from_vec(nodes)
}

/// Both ends of a text selection as textblock points.
struct SelectionPoints {
    anchor: Option<TextPoint>,
    head: Option<TextPoint>,
}

impl SelectionPoints {
    fn capture(doc: &Element, selection: Selection) -> Self {
        match selection {
            Selection::Text { anchor, head } => Self {
                anchor: TextPoint::of(doc, anchor),
                head: TextPoint::of(doc, head),
            },
            Selection::Node { .. } => Self {
                anchor: None,
                head: None,
            },
        }
    }

    fn restore(&self, tr: &mut Transaction) {
        let (Some(anchor), Some(head)) = (self.anchor, self.head) else {
            return;
        };
        if let (Some(anchor), Some(head)) = (anchor.resolve(tr.doc()), head.resolve(tr.doc())) {
            tr.set_selection(Selection::text(anchor, head));
        }
    }
}

/// One textblock overlapping a range, with the overlap in content offsets.
struct InlineRange<'a> {
    pos: usize,
    block: &'a Element,
    from: usize,
    to: usize,
}

fn textblocks_in(doc: &Element, from: usize, to: usize) -> Vec<InlineRange<'_>> {
    let mut out = Vec::new();
    doc.content().nodes_between(from, to, 0, None, &mut |node, pos, _, _| match node {
        Node::Element(el) if el.is_textblock() => {
            let start = pos + 1;
            let end = start + el.content().size();
            out.push(InlineRange {
                pos,
                block: el.as_ref(),
                from: from.max(start) - start,
                to: to.min(end).saturating_sub(start),
            });
            false
        }
        Node::Element(el) => !el.ty().is_atom(),
        Node::Text(_) => false,
    });
    out
}

#[cfg(test)]
mod tests;
