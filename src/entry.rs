use crate::error::ValidationError;
use crate::node::{IdAllocator, Kind, Node, NodeId};

const MIN_TITLE_CHARS: usize = 3;
const MIN_URL_CHARS: usize = 11;

/// User input for a node that is about to be added.
///
/// `icon` is the name as stored in the bookmark file,
/// see [`Paths::import_icon`](crate::settings::Paths::import_icon).
///
/// # Example
///
/// ```
/// # use tui_bookmark_tree::{Kind, NewEntry, Store};
/// let mut store = Store::new("bookmarks.xml");
/// let entry = NewEntry {
///     title: "Search".to_owned(),
///     kind: Some(Kind::Link),
///     action: "https://search.example.com".to_owned(),
///     icon: None,
///     parent: Some(store.root().id()),
/// };
/// let (parent, node) = entry.into_node(store.ids()).unwrap();
/// assert!(store.add(parent, node));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub kind: Option<Kind>,
    pub action: String,
    pub icon: Option<String>,
    pub parent: Option<NodeId>,
}

impl NewEntry {
    /// Check the input in the order a form shows its fields.
    ///
    /// Separators have no label, so the minimum title length only applies to links and groups.
    ///
    /// # Errors
    ///
    /// The first rule the input breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind != Some(Kind::Separator) && self.title.chars().count() < MIN_TITLE_CHARS {
            return Err(ValidationError::TitleTooShort);
        }
        let kind = self.kind.ok_or(ValidationError::MissingKind)?;
        if kind == Kind::Link && self.action.chars().count() < MIN_URL_CHARS {
            return Err(ValidationError::MissingUrl);
        }
        if self.parent.is_none() {
            return Err(ValidationError::MissingParent);
        }
        Ok(())
    }

    /// Validate and build the node with a fresh id. Returns the parent it belongs to as well.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn into_node(self, ids: &mut IdAllocator) -> Result<(NodeId, Node), ValidationError> {
        self.validate()?;
        let kind = self.kind.ok_or(ValidationError::MissingKind)?;
        let parent = self.parent.ok_or(ValidationError::MissingParent)?;

        let mut node = Node::new(ids, kind);
        match kind {
            Kind::Separator => {}
            Kind::Link => {
                node.set_text(self.title);
                node.set_action(Some(self.action).filter(|action| !action.is_empty()));
                node.set_icon(self.icon);
            }
            Kind::Group => {
                node.set_text(self.title);
                node.set_icon(self.icon);
            }
        }
        Ok((parent, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> NewEntry {
        NewEntry {
            title: "Search".to_owned(),
            kind: Some(Kind::Link),
            action: "https://search.example.com".to_owned(),
            icon: Some("search.png".to_owned()),
            parent: Some(NodeId(1)),
        }
    }

    #[test]
    fn valid_link() {
        let mut ids = IdAllocator::default();
        ids.allocate();
        let (parent, node) = link().into_node(&mut ids).unwrap();
        assert_eq!(parent, NodeId(1));
        assert_eq!(node.id(), NodeId(2));
        assert_eq!(node.kind(), Kind::Link);
        assert_eq!(node.text(), "Search");
        assert_eq!(node.action(), Some("https://search.example.com"));
        assert_eq!(node.icon(), Some("search.png"));
    }

    #[test]
    fn title_too_short() {
        let entry = NewEntry {
            title: "ab".to_owned(),
            ..link()
        };
        assert_eq!(entry.validate(), Err(ValidationError::TitleTooShort));

        // Counted in characters, not bytes.
        let entry = NewEntry {
            title: "äö".to_owned(),
            ..link()
        };
        assert_eq!(entry.validate(), Err(ValidationError::TitleTooShort));
    }

    #[test]
    fn title_is_checked_first() {
        let entry = NewEntry::default();
        assert_eq!(entry.validate(), Err(ValidationError::TitleTooShort));
    }

    #[test]
    fn missing_kind() {
        let entry = NewEntry {
            kind: None,
            ..link()
        };
        assert_eq!(entry.validate(), Err(ValidationError::MissingKind));
    }

    #[test]
    fn link_needs_url() {
        let entry = NewEntry {
            action: "http://a.b".to_owned(),
            ..link()
        };
        assert_eq!(entry.validate(), Err(ValidationError::MissingUrl));

        let entry = NewEntry {
            action: "http://a.bc".to_owned(),
            ..link()
        };
        assert_eq!(entry.validate(), Ok(()));
    }

    #[test]
    fn missing_parent() {
        let entry = NewEntry {
            parent: None,
            ..link()
        };
        assert_eq!(entry.validate(), Err(ValidationError::MissingParent));
        let mut ids = IdAllocator::default();
        assert!(entry.into_node(&mut ids).is_err());
        assert_eq!(ids.issued(), 0);
    }

    #[test]
    fn group_without_action() {
        let entry = NewEntry {
            title: "Tools".to_owned(),
            kind: Some(Kind::Group),
            action: String::new(),
            ..link()
        };
        let mut ids = IdAllocator::default();
        let (_, node) = entry.into_node(&mut ids).unwrap();
        assert_eq!(node.kind(), Kind::Group);
        assert_eq!(node.action(), None);
        assert_eq!(node.icon(), Some("search.png"));
    }

    #[test]
    fn separator_ignores_title() {
        let entry = NewEntry {
            title: String::new(),
            kind: Some(Kind::Separator),
            action: String::new(),
            icon: Some("ignored.png".to_owned()),
            parent: Some(NodeId(1)),
        };
        let mut ids = IdAllocator::default();
        let (_, node) = entry.into_node(&mut ids).unwrap();
        assert_eq!(node.kind(), Kind::Separator);
        assert_eq!(node.text(), "");
        assert_eq!(node.icon(), None);
    }

    #[test]
    fn messages() {
        assert_eq!(
            ValidationError::TitleTooShort.to_string(),
            "Title must contain at least 3 characters."
        );
        assert_eq!(ValidationError::MissingUrl.to_string(), "URL required.");
    }
}
