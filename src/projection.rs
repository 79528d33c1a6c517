//! Read-only views derived from a bookmark tree.
//!
//! Both are snapshots. Rebuild them after the [`Store`](crate::Store) changed.

use crate::node::{Kind, Node, NodeId};

/// A [`Kind::Group`] and its sub groups. Used to choose where a new entry goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub id: NodeId,
    pub children: Vec<MenuEntry>,
}

/// Groups only, recursively, starting with `root`.
#[must_use]
pub fn menu_hierarchy(root: &Node) -> MenuEntry {
    MenuEntry {
        label: root.text.clone(),
        id: root.id,
        children: root
            .children
            .iter()
            .filter(|child| child.kind == Kind::Group)
            .map(menu_hierarchy)
            .collect(),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    #[default]
    Normal,
    Bold,
}

/// One line of the searchable view.
///
/// `visible` and `emphasis` are scratch state of the [`Filter`](crate::Filter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub kind: Kind,
    pub action: Option<String>,
    pub visible: bool,
    pub emphasis: Emphasis,
    pub id: NodeId,
    pub children: Vec<Row>,
}

impl Row {
    /// This row and all below, pre-order.
    #[must_use]
    pub fn preorder(&self) -> Vec<&Self> {
        let mut rows = vec![self];
        for child in &self.children {
            rows.extend(child.preorder());
        }
        rows
    }

    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub(crate) fn for_each_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Self),
    {
        visit(self);
        for child in &mut self.children {
            child.for_each_mut(visit);
        }
    }
}

/// Every node except separators, all visible and not emphasized.
#[must_use]
pub fn full_hierarchy(root: &Node) -> Row {
    Row {
        label: root.text.clone(),
        kind: root.kind,
        action: root.action.clone(),
        visible: true,
        emphasis: Emphasis::Normal,
        id: root.id,
        children: root
            .children
            .iter()
            .filter(|child| match child.kind {
                Kind::Separator => false,
                Kind::Link | Kind::Group => true,
            })
            .map(full_hierarchy)
            .collect(),
    }
}
