//! Bullet, ordered and task lists.
//!
//! Markdown has one list node; the kind is picked from the list itself. A
//! list with any `[ ]` or `[x]` item is a task list, and all its items become
//! task items.

use serde_json::{Value, json};

use crate::models::{Attrs, Group, Role};
use crate::parsing::ast::{MdKind, MdNode};
use crate::parsing::state::ParserState;
use crate::registry::descriptor::{Kind, KindDescriptor, MarkdownParse};
use crate::registry::{Extension, Options};

use super::{BlockWriter, NodeRule, attr_bool, attr_u64};

pub struct BulletListExt;
pub struct OrderedListExt;
pub struct ListItemExt;
pub struct TaskListExt;

fn has_task_items(node: &MdNode) -> bool {
    node.children
        .iter()
        .any(|item| matches!(item.kind, MdKind::ListItem { checked: Some(_) }))
}

fn is_bullet_list(node: &MdNode) -> bool {
    matches!(node.kind, MdKind::List { ordered: false, .. }) && !has_task_items(node)
}

fn is_ordered_list(node: &MdNode) -> bool {
    matches!(node.kind, MdKind::List { ordered: true, .. }) && !has_task_items(node)
}

fn is_task_list(node: &MdNode) -> bool {
    matches!(node.kind, MdKind::List { .. }) && has_task_items(node)
}

impl Extension for BulletListExt {
    fn name(&self) -> &'static str {
        "bulletList"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("bulletList", Group::Block)
                .content("listItem+")
                .role(Role::List)
                .parser(NodeRule::new(is_bullet_list))
                .serializer(BlockWriter(|_| MdKind::List {
                    ordered: false,
                    start: 1,
                })),
        ]
    }
}

impl Extension for OrderedListExt {
    fn name(&self) -> &'static str {
        "orderedList"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("orderedList", Group::Block)
                .content("listItem+")
                .role(Role::List)
                .attr("start", json!(1))
                .parser(NodeRule::new(is_ordered_list).with_attrs(|n| match n.kind {
                    MdKind::List { start, .. } => Attrs::from([("start".to_string(), json!(start))]),
                    _ => Attrs::new(),
                }))
                .serializer(BlockWriter(|el| MdKind::List {
                    ordered: true,
                    start: attr_u64(el.attrs(), "start").unwrap_or(1),
                })),
        ]
    }
}

impl Extension for ListItemExt {
    fn name(&self) -> &'static str {
        "listItem"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("listItem", Group::Block)
                .content("paragraph block*")
                .role(Role::ListItem)
                .parser(NodeRule::new(|n| matches!(n.kind, MdKind::ListItem { checked: None })))
                .serializer(BlockWriter(|_| MdKind::ListItem { checked: None })),
        ]
    }
}

impl Extension for TaskListExt {
    fn name(&self) -> &'static str {
        "taskList"
    }

    fn descriptors(&self, _: &Options) -> Vec<KindDescriptor> {
        vec![
            KindDescriptor::node("taskList", Group::Block)
                .content("taskItem+")
                .role(Role::List)
                .parser(TaskListRule)
                .serializer(BlockWriter(|_| MdKind::List {
                    ordered: false,
                    start: 1,
                })),
            KindDescriptor::node("taskItem", Group::Block)
                .content("paragraph block*")
                .role(Role::ListItem)
                .attr("checked", json!(false))
                .parser(NodeRule::new(|n| matches!(n.kind, MdKind::ListItem { checked: Some(_) })).with_attrs(
                    |n| match n.kind {
                        MdKind::ListItem { checked } => {
                            Attrs::from([("checked".to_string(), json!(checked.unwrap_or(false)))])
                        }
                        _ => Attrs::new(),
                    },
                ))
                .serializer(BlockWriter(|el| MdKind::ListItem {
                    checked: Some(attr_bool(el.attrs(), "checked")),
                })),
        ]
    }
}

/// Items without a checkbox in a task list become unchecked task items.
struct TaskListRule;

impl MarkdownParse for TaskListRule {
    fn matches(&self, node: &MdNode) -> bool {
        is_task_list(node)
    }

    fn apply(&self, state: &mut ParserState<'_>, node: &MdNode, kind: &Kind) {
        let Some(list) = kind.as_node() else {
            return;
        };
        let Some(item) = state.registry().node_type("taskItem").cloned() else {
            return;
        };
        state.open_node(list, Attrs::new());
        for child in &node.children {
            let MdKind::ListItem { checked } = child.kind else {
                state.next(std::slice::from_ref(child));
                continue;
            };
            let attrs = Attrs::from([("checked".to_string(), Value::Bool(checked.unwrap_or(false)))]);
            state.open_node(&item, attrs);
            state.next(&child.children);
            state.close_node();
        }
        state.close_node();
    }
}
