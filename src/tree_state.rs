use std::collections::HashSet;

use crate::flatten::{flatten, Flattened};
use crate::node::{Kind, NodeId};
use crate::tree_item::TreeItem;

/// Keeps the state of what is currently selected and what was opened in a [`Tree`](crate::Tree).
///
/// Opened and selected items are stored as the path of [`NodeId`]s leading to them.
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::TreeState;
/// let mut state = TreeState::default();
/// assert_eq!(state.selected_id(), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct TreeState {
    pub(super) offset: usize,
    pub(super) opened: HashSet<Vec<NodeId>>,
    pub(super) selected: Vec<NodeId>,
    pub(super) ensure_selected_in_view_on_next_render: bool,
}

impl TreeState {
    #[must_use]
    pub const fn get_offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn get_all_opened(&self) -> Vec<Vec<NodeId>> {
        self.opened.iter().cloned().collect()
    }

    /// Get a flat list of all visible (= below open) [`TreeItem`]s with this `TreeState`.
    #[must_use]
    pub fn flatten<'a>(&self, items: &'a [TreeItem<'a>]) -> Vec<Flattened<'a>> {
        flatten(&self.opened, items)
    }

    #[must_use]
    pub fn selected(&self) -> Vec<NodeId> {
        self.selected.clone()
    }

    /// The id of the selected node itself, without the path leading to it.
    #[must_use]
    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected.last().copied()
    }

    /// Selects the given identifier.
    ///
    /// Returns `true` when the selection changed.
    ///
    /// Clear the selection by passing an empty identifier vector:
    ///
    /// ```rust
    /// # use tui_bookmark_tree::TreeState;
    /// # let mut state = TreeState::default();
    /// state.select(Vec::new());
    /// ```
    pub fn select(&mut self, identifier: Vec<NodeId>) -> bool {
        self.ensure_selected_in_view_on_next_render = true;
        let changed = self.selected != identifier;
        self.selected = identifier;
        changed
    }

    /// Open a tree node.
    /// Returns `true` if the node was closed and has been opened.
    /// Returns `false` if the node was already open.
    pub fn open(&mut self, identifier: Vec<NodeId>) -> bool {
        if identifier.is_empty() {
            false
        } else {
            self.opened.insert(identifier)
        }
    }

    /// Close a tree node.
    /// Returns `true` if the node was open and has been closed.
    /// Returns `false` if the node was already closed.
    pub fn close(&mut self, identifier: &[NodeId]) -> bool {
        self.opened.remove(identifier)
    }

    /// Toggles a tree node.
    /// If the node is in opened then it calls [`close`](Self::close). Otherwise it calls [`open`](Self::open).
    ///
    /// Returns `true` when a node is opened / closed.
    /// As toggle always changes something, this only returns `false` when an empty identifier is given.
    pub fn toggle(&mut self, identifier: Vec<NodeId>) -> bool {
        if identifier.is_empty() {
            false
        } else if self.opened.contains(&identifier) {
            self.close(&identifier)
        } else {
            self.open(identifier)
        }
    }

    /// Toggles the currently selected tree node.
    /// See also [`toggle`](Self::toggle)
    ///
    /// Returns `true` when a node is opened / closed.
    /// As toggle always changes something, this only returns `false` when nothing is selected.
    pub fn toggle_selected(&mut self) -> bool {
        self.ensure_selected_in_view_on_next_render = true;
        self.toggle(self.selected())
    }

    /// Open every item which has children. Search results and the parent selection are shown this way.
    ///
    /// Returns `true` when any node was opened.
    pub fn open_all(&mut self, items: &[TreeItem]) -> bool {
        fn open_below(
            opened: &mut HashSet<Vec<NodeId>>,
            items: &[TreeItem],
            current: &[NodeId],
        ) -> bool {
            let mut changed = false;
            for item in items.iter().filter(|item| !item.children.is_empty()) {
                let mut identifier = current.to_vec();
                identifier.push(item.identifier);
                changed |= open_below(opened, &item.children, &identifier);
                changed |= opened.insert(identifier);
            }
            changed
        }

        open_below(&mut self.opened, items, &[])
    }

    /// Forget opened paths and the selection when they no longer lead to one of the `items`.
    /// Needed after the tree changed, for example after the selected node was deleted.
    pub fn retain_existing(&mut self, items: &[TreeItem]) {
        fn collect(paths: &mut HashSet<Vec<NodeId>>, items: &[TreeItem], current: &[NodeId]) {
            for item in items {
                let mut identifier = current.to_vec();
                identifier.push(item.identifier);
                collect(paths, &item.children, &identifier);
                paths.insert(identifier);
            }
        }

        let mut existing = HashSet::new();
        collect(&mut existing, items, &[]);
        self.opened.retain(|path| existing.contains(path));
        if !existing.contains(&self.selected) {
            self.select(Vec::new());
        }
    }

    /// Select the first node which is not a separator.
    ///
    /// Returns `true` when the selection changed.
    pub fn select_first(&mut self, items: &[TreeItem]) -> bool {
        let identifier = items
            .iter()
            .find(|item| item.kind != Kind::Separator)
            .map_or(Vec::new(), |item| vec![item.identifier]);
        self.select(identifier)
    }

    /// Select the last visible node which is not a separator.
    ///
    /// Returns `true` when the selection changed.
    pub fn select_last(&mut self, items: &[TreeItem]) -> bool {
        let visible = self.flatten(items);
        let new_identifier = visible
            .into_iter()
            .rev()
            .find(|flattened| flattened.item.kind != Kind::Separator)
            .map_or(Vec::new(), |flattened| flattened.identifier);
        self.select(new_identifier)
    }

    /// Select the next visible node in the given direction which is not a separator.
    /// Without a selection this starts at the very top or bottom.
    fn select_visible_step(&mut self, items: &[TreeItem], forward: bool) -> bool {
        let visible = self.flatten(items);
        let current = visible
            .iter()
            .position(|flattened| flattened.identifier == self.selected);
        let selectable = |flattened: &&Flattened| flattened.item.kind != Kind::Separator;

        let next = if forward {
            let start = current.map_or(0, |current| current + 1);
            visible.iter().skip(start).find(selectable)
        } else {
            let end = current.unwrap_or(visible.len());
            visible[..end].iter().rev().find(selectable)
        };

        let Some(next) = next else {
            return false;
        };
        let identifier = next.identifier.clone();
        self.select(identifier)
    }

    /// Scroll the specified amount of lines up
    ///
    /// Returns `true` when the scroll position changed.
    /// Returns `false` when the scrolling has reached the top.
    pub fn scroll_up(&mut self, lines: usize) -> bool {
        let before = self.offset;
        self.offset = self.offset.saturating_sub(lines);
        before != self.offset
    }

    /// Scroll the specified amount of lines down
    ///
    /// In contrast to [`scroll_up()`](Self::scroll_up) this can not return whether the view position changed or not as the actual change is determined on render.
    /// Always returns `true`.
    pub fn scroll_down(&mut self, lines: usize) -> bool {
        self.offset = self.offset.saturating_add(lines);
        true
    }

    /// Handles the up arrow key.
    /// Moves up in the current depth or to its parent, skipping separators.
    ///
    /// Returns `true` when the selection changed.
    pub fn key_up(&mut self, items: &[TreeItem]) -> bool {
        self.select_visible_step(items, false)
    }

    /// Handles the down arrow key.
    /// Moves down in the current depth or into a child node, skipping separators.
    ///
    /// Returns `true` when the selection changed.
    pub fn key_down(&mut self, items: &[TreeItem]) -> bool {
        self.select_visible_step(items, true)
    }

    /// Handles the left arrow key.
    /// Closes the currently selected or moves to its parent.
    ///
    /// Returns `true` when the selection or the open state changed.
    pub fn key_left(&mut self) -> bool {
        self.ensure_selected_in_view_on_next_render = true;
        // Reimplement self.close because of multiple different borrows
        let mut changed = self.opened.remove(&self.selected);
        if !changed {
            // Select the parent by removing the leaf from selection
            let popped = self.selected.pop();
            changed = popped.is_some();
        }
        changed
    }

    /// Handles the right arrow key.
    /// Opens the currently selected.
    ///
    /// Returns `true` if the node was closed and has been opened.
    /// Returns `false` if the node was already open.
    pub fn key_right(&mut self) -> bool {
        self.ensure_selected_in_view_on_next_render = true;
        self.open(self.selected())
    }
}
