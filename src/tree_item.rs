use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::node::{Kind, Node, NodeId};
use crate::projection::{Emphasis, MenuEntry, Row};

/// One item inside a [`Tree`](crate::Tree).
///
/// Items mirror bookmark [`Node`]s and are identified by their [`NodeId`].
/// As ids are unique in the whole store, the path of ids from the top level down to an item
/// is what the [`TreeState`](crate::TreeState) keeps for opened and selected items.
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::{IdAllocator, Node, TreeItem};
/// let mut ids = IdAllocator::default();
/// let root = Node::group(&mut ids, "Bookmarks")
///     .with_child(Node::link(&mut ids, "Docs", "https://docs.rs"));
/// let items = TreeItem::menu(&root);
/// assert_eq!(items.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TreeItem<'a> {
    pub(super) identifier: NodeId,
    pub(super) kind: Kind,
    pub(super) text: Text<'a>,
    pub(super) style: Style,
    pub(super) children: Vec<TreeItem<'a>>,
}

impl<'a> TreeItem<'a> {
    /// The children of `root`, shown the way a tray menu shows them.
    #[must_use]
    pub fn menu(root: &'a Node) -> Vec<Self> {
        root.children().iter().map(Self::from_node).collect()
    }

    #[must_use]
    pub fn from_node(node: &'a Node) -> Self {
        Self {
            identifier: node.id(),
            kind: node.kind(),
            text: Text::from(Line::from(node.text())),
            style: Style::new(),
            children: node.children().iter().map(Self::from_node).collect(),
        }
    }

    /// Items of a [`MenuEntry`] hierarchy, used to pick the parent of a new entry.
    #[must_use]
    pub fn from_menu_entry(entry: &'a MenuEntry) -> Self {
        Self {
            identifier: entry.id,
            kind: Kind::Group,
            text: Text::from(Line::from(entry.label.as_str())),
            style: Style::new(),
            children: entry.children.iter().map(Self::from_menu_entry).collect(),
        }
    }

    /// Search result item. Links show their action next to the label.
    ///
    /// Returns `None` when the row is not visible. Invisible children are left out.
    #[must_use]
    pub fn from_row(row: &'a Row) -> Option<Self> {
        const ACTION: Style = Style::new().fg(Color::DarkGray);

        if !row.visible {
            return None;
        }

        let mut spans = vec![Span::raw(row.label.as_str())];
        if let (Kind::Link, Some(action)) = (row.kind, &row.action) {
            spans.push(Span::styled(format!("  {action}"), ACTION));
        }

        let style = match row.emphasis {
            Emphasis::Normal => Style::new(),
            Emphasis::Bold => Style::new().add_modifier(Modifier::BOLD),
        };

        Some(Self {
            identifier: row.id,
            kind: row.kind,
            text: Text::from(Line::from(spans)),
            style,
            children: row.children.iter().filter_map(Self::from_row).collect(),
        })
    }

    #[must_use]
    pub const fn identifier(&self) -> NodeId {
        self.identifier
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Get a reference to a child by index.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Self> {
        self.children.get(index)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.text.height()
    }
}

#[cfg(test)]
fn labels(items: &[TreeItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.text.lines[0].spans[0].content.to_string())
        .collect()
}

#[test]
fn menu_starts_below_the_root() {
    let mut ids = crate::IdAllocator::default();
    let root = Node::example(&mut ids);
    let items = TreeItem::menu(&root);
    assert_eq!(labels(&items), ["Work", "Docs", "", "Private"]);
    assert_eq!(items[2].kind(), Kind::Separator);
    assert_eq!(labels(items[0].children()), ["Mail", "Calendar"]);
    assert_eq!(items[3].child(0).map(TreeItem::identifier), Some(root.id_of("News")));
}

#[test]
fn menu_entry_items() {
    let mut ids = crate::IdAllocator::default();
    let root = Node::example(&mut ids);
    let menu = crate::menu_hierarchy(&root);
    let item = TreeItem::from_menu_entry(&menu);
    assert_eq!(item.identifier(), root.id());
    assert_eq!(labels(item.children()), ["Work", "Private"]);
    assert!(item.children().iter().all(|item| item.kind() == Kind::Group));
}

#[test]
fn row_items_follow_the_filter() {
    let mut ids = crate::IdAllocator::default();
    let root = Node::example(&mut ids);
    let mut rows = crate::full_hierarchy(&root);
    crate::Filter::new("mail").apply(&mut rows);

    let item = TreeItem::from_row(&rows).expect("root is visible");
    assert_eq!(labels(item.children()), ["Work", "Private"]);
    assert_eq!(item.style, Style::new());

    let mail = &item.children()[0].children()[0];
    assert_eq!(mail.style, Style::new().add_modifier(Modifier::BOLD));
    assert_eq!(mail.text.lines[0].spans[1].content, "  https://mail.example.com");
    assert_eq!(item.children()[1].children().len(), 1);
}

#[test]
fn invisible_row_has_no_item() {
    let mut ids = crate::IdAllocator::default();
    let root = Node::example(&mut ids);
    let mut rows = crate::full_hierarchy(&root);
    crate::Filter::new("nothing matches this").apply(&mut rows);
    assert!(TreeItem::from_row(&rows).is_none());
}
