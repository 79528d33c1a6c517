use crate::projection::{Emphasis, Row};

/// Decides which [`Row`]s are shown for a search query.
///
/// A row matches when the query is a case-insensitive substring of its label.
/// Matches are emphasized and shown together with all their ancestors.
/// With [`show_subtrees_of_matches`](Self::show_subtrees_of_matches) everything below a match is shown too.
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::{Filter, IdAllocator, Node, projection};
/// let mut ids = IdAllocator::default();
/// let root = Node::group(&mut ids, "Bookmarks")
///     .with_child(Node::link(&mut ids, "Mail", "https://mail.example.com"))
///     .with_child(Node::link(&mut ids, "Docs", "https://docs.example.com"));
///
/// let mut rows = projection::full_hierarchy(&root);
/// Filter::new("MAIL").apply(&mut rows);
/// assert!(rows.visible);
/// assert!(rows.children[0].visible);
/// assert!(!rows.children[1].visible);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    query: String,
    show_subtrees_of_matches: bool,
}

impl Filter {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_lowercase(),
            show_subtrees_of_matches: false,
        }
    }

    #[must_use]
    pub const fn show_subtrees_of_matches(mut self, show: bool) -> Self {
        self.show_subtrees_of_matches = show;
        self
    }

    /// The query, lowercased.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn is_match(&self, label: &str) -> bool {
        label.to_lowercase().contains(&self.query)
    }

    /// Recompute `visible` and `emphasis` of every row.
    ///
    /// First every row is reset: visible only for an empty query, never emphasized.
    /// Then matches and the rows they reveal are marked.
    pub fn apply(&self, rows: &mut Row) {
        let reset_to = self.query.is_empty();
        rows.for_each_mut(&mut |row| {
            row.visible = reset_to;
            row.emphasis = Emphasis::Normal;
        });

        if !self.query.is_empty() {
            self.show_matches(rows);
        }
    }

    /// Returns whether `row` or anything below it matched, which makes `row` visible for its parent.
    fn show_matches(&self, row: &mut Row) -> bool {
        let matched = self.is_match(&row.label);
        if matched {
            row.emphasis = Emphasis::Bold;
            row.visible = true;
            if self.show_subtrees_of_matches {
                show_subtree(row);
            }
        }

        let mut below = false;
        for child in &mut row.children {
            below |= self.show_matches(child);
        }
        if below {
            row.visible = true;
        }
        matched || below
    }
}

/// Reveal everything below `row`. Children already visible were revealed before, including their subtree.
fn show_subtree(row: &mut Row) {
    for child in &mut row.children {
        if child.visible {
            continue;
        }
        child.visible = true;
        show_subtree(child);
    }
}
