use std::fmt;

/// Identity of a [`Node`] inside one [`Store`](crate::Store).
///
/// Ids are handed out by an [`IdAllocator`] and are never written to the bookmark file.
/// Every load allocates fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`NodeId`]s.
///
/// A store owns exactly one allocator, so two stores in the same process never hand out colliding ids
/// and an id is never issued twice by the same store, not even across reloads.
///
/// ```
/// # use tui_bookmark_tree::IdAllocator;
/// let mut ids = IdAllocator::default();
/// let first = ids.allocate();
/// let second = ids.allocate();
/// assert!(first < second);
/// ```
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn allocate(&mut self) -> NodeId {
        self.last += 1;
        NodeId(self.last)
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.last
    }
}

/// What a [`Node`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Visual divider without text, action or children.
    Separator,
    /// Actionable leaf, usually opening the URL in its action.
    Link,
    /// Submenu containing other nodes.
    Group,
}

impl Kind {
    pub const ALL: [Self; 3] = [Self::Separator, Self::Link, Self::Group];

    /// Tag used in the bookmark file and shown to users.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Separator => "separator",
            Self::Link => "www",
            Self::Group => "menu",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One entry of the bookmark tree.
///
/// The `kind` is fixed on creation.
/// Every other part can be changed, the `children` only through the [`Store`](crate::Store) or the builder methods.
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::{IdAllocator, Kind, Node};
/// let mut ids = IdAllocator::default();
/// let work = Node::group(&mut ids, "Work")
///     .with_child(Node::link(&mut ids, "Mail", "https://mail.example.com"))
///     .with_child(Node::separator(&mut ids));
/// assert_eq!(work.kind(), Kind::Group);
/// assert_eq!(work.children().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) text: String,
    pub(crate) kind: Kind,
    pub(crate) action: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) children: Vec<Node>,
}

impl Node {
    /// Create an empty node of the given `kind` with a fresh id.
    pub fn new(ids: &mut IdAllocator, kind: Kind) -> Self {
        Self {
            id: ids.allocate(),
            text: String::new(),
            kind,
            action: None,
            icon: None,
            children: Vec::new(),
        }
    }

    pub fn separator(ids: &mut IdAllocator) -> Self {
        Self::new(ids, Kind::Separator)
    }

    pub fn link<T, A>(ids: &mut IdAllocator, text: T, action: A) -> Self
    where
        T: Into<String>,
        A: Into<String>,
    {
        let mut node = Self::new(ids, Kind::Link);
        node.text = text.into();
        node.action = Some(action.into());
        node
    }

    pub fn group<T>(ids: &mut IdAllocator, text: T) -> Self
    where
        T: Into<String>,
    {
        let mut node = Self::new(ids, Kind::Group);
        node.text = text.into();
        node
    }

    #[must_use]
    pub fn with_icon<T>(mut self, icon: T) -> Self
    where
        T: Into<String>,
    {
        self.icon = Some(icon.into());
        self
    }

    /// Append a child. Meant for building a subtree before handing it to [`Store::add`](crate::Store::add).
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn set_text<T>(&mut self, text: T)
    where
        T: Into<String>,
    {
        self.text = text.into();
    }

    pub fn set_action(&mut self, action: Option<String>) {
        self.action = action;
    }

    pub fn set_icon(&mut self, icon: Option<String>) {
        self.icon = icon;
    }

    /// Whether any direct child is a [`Kind::Group`].
    #[must_use]
    pub fn has_submenus(&self) -> bool {
        self.children.iter().any(|child| child.kind == Kind::Group)
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }

    /// Pre-order search in this subtree, `self` included.
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: NodeId) -> Option<&mut Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Remove the first descendant with the given id, searching pre-order among the children of each visited node.
    /// `self` is never matched.
    pub(crate) fn remove_descendant(&mut self, id: NodeId) -> Option<Self> {
        for index in 0..self.children.len() {
            if self.children[index].id == id {
                return Some(self.children.remove(index));
            }
            if let Some(removed) = self.children[index].remove_descendant(id) {
                return Some(removed);
            }
        }
        None
    }

    /// Visit this subtree pre-order.
    pub fn for_each<F>(&self, visit: &mut F)
    where
        F: FnMut(&Self),
    {
        visit(self);
        for child in &self.children {
            child.for_each(visit);
        }
    }
}

#[cfg(test)]
impl Node {
    /// ```text
    /// Bookmarks
    /// ├─ Work
    /// │  ├─ Mail
    /// │  └─ Calendar
    /// ├─ Docs
    /// ├─ ──────
    /// └─ Private
    ///    ├─ News
    ///    │  └─ Weather
    ///    └─ Mail Archive
    /// ```
    pub(crate) fn example(ids: &mut IdAllocator) -> Self {
        Self::group(ids, "Bookmarks")
            .with_child(
                Self::group(ids, "Work")
                    .with_child(Self::link(ids, "Mail", "https://mail.example.com"))
                    .with_child(Self::link(ids, "Calendar", "https://calendar.example.com")),
            )
            .with_child(Self::link(ids, "Docs", "https://docs.example.com").with_icon("docs.png"))
            .with_child(Self::separator(ids))
            .with_child(
                Self::group(ids, "Private")
                    .with_icon("home.png")
                    .with_child(
                        Self::group(ids, "News")
                            .with_child(Self::link(ids, "Weather", "https://weather.example.com")),
                    )
                    .with_child(Self::link(ids, "Mail Archive", "https://archive.example.com")),
            )
    }

    /// Id of the first node labeled `text`.
    #[track_caller]
    pub(crate) fn id_of(&self, text: &str) -> NodeId {
        let mut found = None;
        self.for_each(&mut |node| {
            if found.is_none() && node.text == text {
                found = Some(node.id);
            }
        });
        found.unwrap_or_else(|| panic!("no node labeled {text}"))
    }
}

#[test]
fn allocator_is_monotonic() {
    let mut ids = IdAllocator::default();
    let a = ids.allocate();
    let b = ids.allocate();
    assert!(a < b);
    assert_eq!(ids.issued(), 2);
}

#[test]
fn example_ids_are_preorder() {
    let mut ids = IdAllocator::default();
    let root = Node::example(&mut ids);
    let mut order = Vec::new();
    root.for_each(&mut |node| order.push(node.id.get()));
    assert_eq!(order, (1..=10).collect::<Vec<_>>());
}

#[test]
fn kind_tags_round_trip() {
    for kind in Kind::ALL {
        assert_eq!(Kind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(Kind::from_tag("ftp"), None);
}

#[test]
fn remove_descendant_never_matches_self() {
    let mut ids = IdAllocator::default();
    let mut root = Node::example(&mut ids);
    let root_id = root.id;
    assert_eq!(root.remove_descendant(root_id), None);
    assert_eq!(root.subtree_len(), 10);
}

#[test]
fn remove_descendant_takes_whole_subtree() {
    let mut ids = IdAllocator::default();
    let mut root = Node::example(&mut ids);
    let news = root.id_of("News");
    let removed = root.remove_descendant(news).expect("News exists");
    assert_eq!(removed.subtree_len(), 2);
    assert_eq!(root.subtree_len(), 8);
    assert!(root.find(news).is_none());
}

#[test]
fn has_submenus() {
    let mut ids = IdAllocator::default();
    let root = Node::example(&mut ids);
    assert!(root.has_submenus());
    let work = root.find(root.id_of("Work")).unwrap();
    assert!(!work.has_submenus());
}
