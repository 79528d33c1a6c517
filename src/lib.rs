#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]

/*!
Bookmark menus stored as XML and shown as a tree in the terminal.

The bookmarks are [`Node`]s owned by a [`Store`] which loads and saves them.
Nodes are addressed by their [`NodeId`], which is unique within a store.

The store provides two read-only views:
[`menu_hierarchy`] with groups only and [`full_hierarchy`] with everything but separators.
The latter is narrowed down with a [`Filter`].

Every tree can be shown with the [`Tree`] widget which is generated with [`TreeItem`]s.
The user interaction state (like the current selection) is stored in the [`TreeState`].
*/

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Scrollbar, ScrollbarState, StatefulWidget, Widget};
use unicode_width::UnicodeWidthStr;

mod entry;
mod error;
mod filter;
mod flatten;
mod node;
pub mod projection;
pub mod settings;
mod store;
mod tree_item;
mod tree_state;
mod xml;

pub use crate::entry::NewEntry;
pub use crate::error::{ParseError, SaveError, SettingsError, ValidationError};
pub use crate::filter::Filter;
pub use crate::flatten::Flattened;
pub use crate::node::{IdAllocator, Kind, Node, NodeId};
pub use crate::projection::{full_hierarchy, menu_hierarchy, Emphasis, MenuEntry, Row};
pub use crate::settings::{Paths, Settings};
pub use crate::store::{LoadResult, Store, DEFAULT_ROOT_LABEL};
pub use crate::tree_item::TreeItem;
pub use crate::tree_state::TreeState;

/// Shown in front of a group whose children are hidden.
const NODE_CLOSED_SYMBOL: &str = "\u{25b6} ";
/// Shown in front of a group whose children are visible.
const NODE_OPEN_SYMBOL: &str = "\u{25bc} ";
const NODE_NO_CHILDREN_SYMBOL: &str = "  ";
/// Repeated over the whole line of a separator.
const SEPARATOR_SYMBOL: &str = "\u{2500}";

/// A `Tree` which can be rendered.
///
/// The [`NodeId`]s of the [`TreeItem`]s are used to keep the state like the currently selected or opened items in the [`TreeState`].
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::{IdAllocator, Node, Tree, TreeItem, TreeState};
/// # use ratatui::backend::TestBackend;
/// # use ratatui::Terminal;
/// # use ratatui::widgets::Block;
/// # let mut terminal = Terminal::new(TestBackend::new(32, 32)).unwrap();
/// let mut ids = IdAllocator::default();
/// let root = Node::group(&mut ids, "Bookmarks")
///     .with_child(Node::link(&mut ids, "Docs", "https://docs.rs"));
/// let mut state = TreeState::default();
///
/// terminal.draw(|frame| {
///     let area = frame.size();
///
///     let tree_widget = Tree::new(TreeItem::menu(&root))
///         .block(Block::bordered().title("Bookmarks"));
///
///     frame.render_stateful_widget(tree_widget, area, &mut state);
/// })?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tree<'a> {
    items: Vec<TreeItem<'a>>,

    block: Option<Block<'a>>,
    scrollbar: Option<Scrollbar<'a>>,

    /// Style used to render selected item
    highlight_style: Style,
    /// Symbol in front of the selected item (Shift all items to the right)
    highlight_symbol: &'a str,
}

impl<'a> Tree<'a> {
    #[must_use]
    pub const fn new(items: Vec<TreeItem<'a>>) -> Self {
        Self {
            items,
            block: None,
            scrollbar: None,
            highlight_style: Style::new(),
            highlight_symbol: "",
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Show the scrollbar when rendering this widget.
    ///
    /// Experimental: Can change on any release without any additional notice.
    #[must_use]
    pub const fn experimental_scrollbar(mut self, scrollbar: Option<Scrollbar<'a>>) -> Self {
        self.scrollbar = scrollbar;
        self
    }

    #[must_use]
    pub const fn highlight_style(mut self, style: Style) -> Self {
        self.highlight_style = style;
        self
    }

    #[must_use]
    pub const fn highlight_symbol(mut self, highlight_symbol: &'a str) -> Self {
        self.highlight_symbol = highlight_symbol;
        self
    }
}

impl<'a> StatefulWidget for Tree<'a> {
    type State = TreeState;

    #[allow(clippy::too_many_lines)]
    fn render(self, full_area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        // Get the inner area inside a possible block, otherwise use the full area
        let area = self.block.map_or(full_area, |block| {
            let inner_area = block.inner(full_area);
            block.render(full_area, buf);
            inner_area
        });

        if area.width < 1 || area.height < 1 {
            return;
        }

        let visible = state.flatten(&self.items);
        if visible.is_empty() {
            return;
        }
        let available_height = area.height as usize;

        let ensure_index_in_view =
            if state.ensure_selected_in_view_on_next_render && !state.selected.is_empty() {
                visible
                    .iter()
                    .position(|flattened| flattened.identifier == state.selected)
            } else {
                None
            };

        // Ensure last line is still visible
        let mut start = state.offset.min(visible.len().saturating_sub(1));

        if let Some(ensure_index_in_view) = ensure_index_in_view {
            start = start.min(ensure_index_in_view);
        }

        let mut end = start;
        let mut height = 0;
        for item_height in visible
            .iter()
            .skip(start)
            .map(|flattened| flattened.item.height())
        {
            if height + item_height > available_height {
                break;
            }
            height += item_height;
            end += 1;
        }

        if let Some(ensure_index_in_view) = ensure_index_in_view {
            while ensure_index_in_view >= end {
                height += visible[end].item.height();
                end += 1;
                while height > available_height {
                    height = height.saturating_sub(visible[start].item.height());
                    start += 1;
                }
            }
        }

        state.offset = start;
        state.ensure_selected_in_view_on_next_render = false;

        if let Some(scrollbar) = self.scrollbar {
            let mut scrollbar_state = ScrollbarState::new(visible.len().saturating_sub(height))
                .position(start)
                .viewport_content_length(height);
            let scrollbar_area = Rect {
                // Inner height to be exactly as the content
                y: area.y,
                height: area.height,
                // Outer width to stay on the right border
                x: full_area.x,
                width: full_area.width,
            };
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }

        let blank_symbol = " ".repeat(self.highlight_symbol.width());

        let mut current_height = 0;
        let has_selection = !state.selected.is_empty();
        #[allow(clippy::cast_possible_truncation)]
        for flattened in visible.into_iter().skip(state.offset).take(end - start) {
            let Flattened {
                ref identifier,
                item,
            } = flattened;

            let x = area.x;
            let y = area.y + current_height;
            let height = item.height() as u16;
            current_height += height;

            let area = Rect {
                x,
                y,
                width: area.width,
                height,
            };

            let item_style = item.style;
            buf.set_style(area, item_style);

            let is_selected = state.selected == *identifier;
            let after_highlight_symbol_x = if has_selection {
                let symbol = if is_selected {
                    self.highlight_symbol
                } else {
                    &blank_symbol
                };
                let (x, _) = buf.set_stringn(x, y, symbol, area.width as usize, item_style);
                x
            } else {
                x
            };

            let indent_width = flattened.depth() * 2;
            let (after_indent_x, _) = buf.set_stringn(
                after_highlight_symbol_x,
                y,
                " ".repeat(indent_width),
                indent_width,
                item_style,
            );
            let max_width = area.width.saturating_sub(after_indent_x - x) as usize;

            if item.kind == Kind::Separator {
                let repeat = max_width / SEPARATOR_SYMBOL.width();
                buf.set_stringn(
                    after_indent_x,
                    y,
                    SEPARATOR_SYMBOL.repeat(repeat),
                    max_width,
                    item_style,
                );
            } else {
                let symbol = if item.children.is_empty() {
                    NODE_NO_CHILDREN_SYMBOL
                } else if state.opened.contains(identifier) {
                    NODE_OPEN_SYMBOL
                } else {
                    NODE_CLOSED_SYMBOL
                };
                let (after_depth_x, _) =
                    buf.set_stringn(after_indent_x, y, symbol, max_width, item_style);

                let max_element_width = area.width.saturating_sub(after_depth_x - x);
                for (j, line) in item.text.lines.iter().enumerate() {
                    buf.set_line(after_depth_x, y + j as u16, line, max_element_width);
                }
            }
            if is_selected {
                buf.set_style(area, self.highlight_style);
            }
        }
    }
}

impl<'a> Widget for Tree<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut state = TreeState::default();
        StatefulWidget::render(self, area, buf, &mut state);
    }
}
