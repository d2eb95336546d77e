//! The block menu opened from the drag handle.

use crate::editing::Command;
use crate::models::{Attrs, Element};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    CopyBlock,
    DeleteBlock,
    Separator,
    Paragraph,
    Heading(u8),
    OrderedList,
    BulletList,
    TaskList,
    Blockquote,
    CodeBlock,
}

/// Full menu for blocks with editable content, in display order.
const FULL: [MenuItem; 14] = [
    MenuItem::CopyBlock,
    MenuItem::DeleteBlock,
    MenuItem::Separator,
    MenuItem::Paragraph,
    MenuItem::Heading(1),
    MenuItem::Heading(2),
    MenuItem::Heading(3),
    MenuItem::Separator,
    MenuItem::OrderedList,
    MenuItem::BulletList,
    MenuItem::TaskList,
    MenuItem::Separator,
    MenuItem::Blockquote,
    MenuItem::CodeBlock,
];

impl MenuItem {
    pub fn id(&self) -> &'static str {
        match self {
            MenuItem::CopyBlock => "copyBlock",
            MenuItem::DeleteBlock => "deleteBlock",
            MenuItem::Separator => "|",
            MenuItem::Paragraph => "paragraph",
            MenuItem::Heading(1) => "heading1",
            MenuItem::Heading(2) => "heading2",
            MenuItem::Heading(3) => "heading3",
            MenuItem::Heading(_) => "heading",
            MenuItem::OrderedList => "orderedList",
            MenuItem::BulletList => "bulletList",
            MenuItem::TaskList => "taskList",
            MenuItem::Blockquote => "blockquote",
            MenuItem::CodeBlock => "codeBlock",
        }
    }

    /// The node kind this item needs registered, if any.
    fn requires(&self) -> Option<&'static str> {
        match self {
            MenuItem::CopyBlock | MenuItem::DeleteBlock | MenuItem::Separator => None,
            MenuItem::Heading(_) => Some("heading"),
            other => Some(other.id()),
        }
    }

    /// The transform this item runs on the pinned selection. Copy and
    /// delete act on the block itself and are handled by the caller.
    pub fn command(&self) -> Option<Command> {
        match self {
            MenuItem::Paragraph => Some(Command::set_block_type("paragraph", Attrs::new())),
            MenuItem::Heading(level) => Some(Command::heading(*level)),
            MenuItem::CodeBlock => Some(Command::set_block_type("codeBlock", Attrs::new())),
            MenuItem::OrderedList | MenuItem::BulletList | MenuItem::TaskList => {
                Some(Command::toggle_list(self.id()))
            }
            MenuItem::Blockquote => Some(Command::wrap_in("blockquote")),
            MenuItem::CopyBlock | MenuItem::DeleteBlock | MenuItem::Separator => None,
        }
    }
}

/// Items offered for `block`. Atoms can only be copied or deleted; items
/// for kinds the registry lacks are left out.
pub fn menu_items(registry: &Registry, block: &Element) -> Vec<MenuItem> {
    if block.ty().is_atom() {
        return vec![MenuItem::CopyBlock, MenuItem::DeleteBlock];
    }
    let available = FULL
        .iter()
        .copied()
        .filter(|item| item.requires().is_none_or(|kind| registry.node_type(kind).is_some()));
    tidy_separators(available)
}

/// Drop leading, trailing and doubled separators.
fn tidy_separators(items: impl Iterator<Item = MenuItem>) -> Vec<MenuItem> {
    let mut out: Vec<MenuItem> = Vec::new();
    for item in items {
        if item == MenuItem::Separator && out.last().is_none_or(|last| *last == MenuItem::Separator) {
            continue;
        }
        out.push(item);
    }
    if out.last() == Some(&MenuItem::Separator) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ConfigMap, ExtensionConfig, compose, kinds::starter_kit};
    use crate::test_support::*;
    use pretty_assertions::assert_eq;

    fn ids(items: &[MenuItem]) -> Vec<&'static str> {
        items.iter().map(MenuItem::id).collect()
    }

    #[test]
    fn atoms_get_copy_and_delete() {
        let b = builder();
        let Some(hr) = b.hr().as_element().cloned() else {
            panic!("hr is an element");
        };
        assert_eq!(ids(&menu_items(&b.registry, &hr)), ["copyBlock", "deleteBlock"]);
    }

    #[test]
    fn text_blocks_get_the_full_menu() {
        let b = builder();
        let p = b.element("paragraph", Attrs::new(), vec![b.text("x")]);
        assert_eq!(
            ids(&menu_items(&b.registry, &p)).join(" "),
            "copyBlock deleteBlock | paragraph heading1 heading2 heading3 | orderedList bulletList taskList | blockquote codeBlock"
        );
    }

    #[test]
    fn missing_kinds_never_leave_double_separators() {
        let config: ConfigMap = [
            ("orderedList".to_string(), ExtensionConfig::Disabled),
            ("bulletList".to_string(), ExtensionConfig::Disabled),
            ("taskList".to_string(), ExtensionConfig::Disabled),
            ("blockquote".to_string(), ExtensionConfig::Disabled),
            ("codeBlock".to_string(), ExtensionConfig::Disabled),
        ]
        .into_iter()
        .collect();
        let registry = compose(&starter_kit(), &config);
        let b = builder();
        let p = b.element("paragraph", Attrs::new(), vec![]);
        assert_eq!(
            ids(&menu_items(&registry, &p)).join(" "),
            "copyBlock deleteBlock | paragraph heading1 heading2 heading3"
        );
    }

    #[test]
    fn list_items_swap_lists() {
        assert_eq!(MenuItem::TaskList.command(), Some(Command::toggle_list("taskList")));
        assert_eq!(MenuItem::CopyBlock.command(), None);
    }
}
