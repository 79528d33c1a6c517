use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ParseError, SaveError};
use crate::node::{IdAllocator, Kind, Node, NodeId};
use crate::projection::{self, MenuEntry, Row};
use crate::xml;

/// Label of the root created for an empty bookmark file.
pub const DEFAULT_ROOT_LABEL: &str = "Menu";

/// Outcome of a successful [`Store::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// The file was empty. A new root was created and the caller may want to confirm this is intended.
    Created,
    /// The file was parsed.
    Loaded,
}

/// Owns a bookmark tree and the file it belongs to.
///
/// All mutations are addressed by [`NodeId`].
/// [`add`](Self::add) and [`delete`](Self::delete) only change the tree in memory, call [`save`](Self::save) afterwards.
/// Projections like [`menu_hierarchy`](Self::menu_hierarchy) are snapshots and have to be rebuilt after every change.
///
/// # Example
///
/// ```no_run
/// # use tui_bookmark_tree::{LoadResult, Node, Store};
/// let (mut store, result) = Store::open("lesezeichen.xml")?;
/// if result == LoadResult::Created {
///     println!("starting with an empty bookmark file");
/// }
///
/// let root = store.root().id();
/// let link = Node::link(store.ids(), "Docs", "https://docs.rs");
/// if store.add(root, link) {
///     store.save()?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    ids: IdAllocator,
    root: Node,
}

impl Store {
    /// Create a store for `path` without reading it yet.
    ///
    /// The tree consists of an empty root named [`DEFAULT_ROOT_LABEL`] until [`load`](Self::load) is called.
    #[must_use]
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        let mut ids = IdAllocator::default();
        let root = Node::group(&mut ids, DEFAULT_ROOT_LABEL);
        Self {
            path: path.into(),
            ids,
            root,
        }
    }

    /// Create a store for `path` and [`load`](Self::load) it.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn open<P>(path: P) -> Result<(Self, LoadResult), ParseError>
    where
        P: Into<PathBuf>,
    {
        let mut store = Self::new(path);
        let result = store.load()?;
        Ok((store, result))
    }

    /// (Re)read the file and replace the tree.
    ///
    /// An empty or whitespace-only file is a valid, new bookmark file.
    /// All nodes get new ids, ids from before the load are never handed out again.
    ///
    /// # Errors
    ///
    /// Errors when the file can not be read or is not a bookmark document.
    /// The current tree is kept in that case.
    pub fn load(&mut self) -> Result<LoadResult, ParseError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ParseError::Read {
            path: self.path.clone(),
            source,
        })?;

        if contents.trim().is_empty() {
            self.root = Node::group(&mut self.ids, DEFAULT_ROOT_LABEL);
            tracing::debug!(path = %self.path.display(), "bookmark file is empty, created a new root");
            return Ok(LoadResult::Created);
        }

        self.root = xml::parse(&contents, &mut self.ids)?;
        tracing::debug!(
            path = %self.path.display(),
            nodes = self.root.subtree_len(),
            "loaded bookmarks"
        );
        Ok(LoadResult::Loaded)
    }

    /// Write the tree to the file.
    ///
    /// The previous file is copied to [`backup_path`](Self::backup_path) first.
    /// The new content is written next to the file and moved over it afterwards, so a failing write does not truncate it.
    /// The permissions of the file are kept.
    ///
    /// # Errors
    ///
    /// Errors when the backup or the write fails.
    pub fn save(&self) -> Result<(), SaveError> {
        let bytes = xml::to_vec(&self.root)?;

        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|source| SaveError::Backup {
            from: self.path.clone(),
            to: backup.clone(),
            source,
        })?;

        self.replace_file(&bytes)
            .map_err(|source| SaveError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            backup = %backup.display(),
            nodes = self.root.subtree_len(),
            "saved bookmarks"
        );
        Ok(())
    }

    fn replace_file(&self, bytes: &[u8]) -> std::io::Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = fs::metadata(&self.path)?.permissions();
        let mut file = tempfile::NamedTempFile::new_in(directory)?;
        file.write_all(bytes)?;
        file.as_file().set_permissions(permissions)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Append `node` as the last child of the node with id `parent`.
    ///
    /// Searches depth-first, pre-order, starting with the root.
    /// Returns `false` and leaves the tree unchanged (dropping `node`) when there is no such node.
    ///
    /// The ids of `node` and its subtree have to come from [`ids`](Self::ids) and must not be in the tree yet.
    /// Otherwise `node` is rejected the same way.
    pub fn add(&mut self, parent: NodeId, node: Node) -> bool {
        if !self.accepts_ids_of(&node) {
            tracing::warn!(id = %node.id, "rejecting node with ids not issued by this store");
            return false;
        }
        let Some(parent_node) = self.root.find_mut(parent) else {
            return false;
        };
        parent_node.children.push(node);
        true
    }

    fn accepts_ids_of(&self, node: &Node) -> bool {
        let mut taken = HashSet::new();
        self.root.for_each(&mut |existing| {
            taken.insert(existing.id);
        });

        let issued = self.ids.issued();
        let mut accepted = true;
        node.for_each(&mut |new| {
            accepted &= new.id.get() <= issued && taken.insert(new.id);
        });
        accepted
    }

    /// Remove the node with the given id including its subtree.
    ///
    /// Only children are matched, so the root itself can never be deleted.
    /// Returns `false` when no node below the root has this id.
    pub fn delete(&mut self, id: NodeId) -> bool {
        self.root.remove_descendant(id).is_some()
    }

    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    /// Mutable access for editing the label, action or icon of a node.
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.root.find_mut(id)
    }

    /// Invoke `on_action` with the action of the link with this id.
    ///
    /// Returns `false` when the node does not exist, is not a link or has no action.
    pub fn activate<F>(&self, id: NodeId, on_action: F) -> bool
    where
        F: FnOnce(&str),
    {
        let Some(node) = self.find(id) else {
            return false;
        };
        match (node.kind(), node.action()) {
            (Kind::Link, Some(action)) => {
                on_action(action);
                true
            }
            (Kind::Link, None) | (Kind::Group | Kind::Separator, _) => false,
        }
    }

    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// Allocator for nodes which are going to be [`add`](Self::add)ed to this store.
    ///
    /// A store can not be cloned, the copy would hand out the same ids again:
    ///
    /// ```compile_fail
    /// # use tui_bookmark_tree::Store;
    /// let store = Store::new("lesezeichen.xml");
    /// let copy = store.clone();
    /// ```
    pub fn ids(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path>~`, overwritten on every [`save`](Self::save).
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = OsString::from(self.path.as_os_str());
        backup.push("~");
        PathBuf::from(backup)
    }

    /// Groups only, starting with the root. Used to pick the parent of a new entry.
    #[must_use]
    pub fn menu_hierarchy(&self) -> MenuEntry {
        projection::menu_hierarchy(&self.root)
    }

    /// Everything except separators, ready to be [filtered](crate::Filter).
    #[must_use]
    pub fn full_hierarchy(&self) -> Row {
        projection::full_hierarchy(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::Filter;

    /// Kind, text, action, icon and children. Everything but the ids.
    #[derive(Debug, PartialEq, Eq)]
    struct Shape(Kind, String, Option<String>, Option<String>, Vec<Shape>);

    fn shape(node: &Node) -> Shape {
        Shape(
            node.kind(),
            node.text().to_owned(),
            node.action().map(ToOwned::to_owned),
            node.icon().map(ToOwned::to_owned),
            node.children().iter().map(shape).collect(),
        )
    }

    fn labels(node: &Node) -> Vec<&str> {
        node.children().iter().map(Node::text).collect()
    }

    fn write_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("lesezeichen.xml");
        fs::write(&path, contents).unwrap();
        path
    }

    const TWO_LEVEL: &str = r#"<menu name="Root">
 <menu name="Work">
  <item><text>Mail</text><action type="www">https://mail</action></item>
 </menu>
 <item><text>Docs</text><action type="www">https://docs</action></item>
</menu>"#;

    #[test]
    fn zero_byte_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "");
        let (store, result) = Store::open(path).unwrap();
        assert_eq!(result, LoadResult::Created);
        assert_eq!(store.root().kind(), Kind::Group);
        assert_eq!(store.root().text(), "Menu");
        assert!(store.root().children().is_empty());
    }

    #[test]
    fn whitespace_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, " \n\t \n");
        let (_, result) = Store::open(path).unwrap();
        assert_eq!(result, LoadResult::Created);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = Store::open(dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }), "{err:?}");
    }

    #[test]
    fn malformed_file_keeps_current_tree() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(&path).unwrap();
        let before = shape(store.root());

        fs::write(&path, "<menu name=\"Root\"><item></menu>").unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }), "{err:?}");
        assert_eq!(shape(store.root()), before);
    }

    #[test]
    fn ids_are_unique_after_load() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (store, result) = Store::open(path).unwrap();
        assert_eq!(result, LoadResult::Loaded);

        let mut seen = HashSet::new();
        store.root().for_each(&mut |node| assert!(seen.insert(node.id())));
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn reload_never_reuses_ids() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(path).unwrap();
        let mut before = HashSet::new();
        store.root().for_each(&mut |node| {
            before.insert(node.id());
        });

        store.load().unwrap();
        store.root().for_each(&mut |node| assert!(!before.contains(&node.id())));
    }

    #[test]
    fn stores_have_independent_allocators() {
        let mut first = Store::new("first.xml");
        let mut second = Store::new("second.xml");
        let a = first.ids().allocate();
        let b = second.ids().allocate();
        // Both allocators start fresh, independent of each other.
        assert_eq!(a, b);
        assert_eq!(first.ids().allocate().get(), 3);
    }

    #[test]
    fn round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "");
        let (mut store, _) = Store::open(&path).unwrap();

        let mut ids = IdAllocator::default();
        let example = Node::example(&mut ids);
        for child in example.children {
            let child = reassign(store.ids(), child);
            assert!(store.add(store.root().id(), child));
        }
        store.save().unwrap();

        let (reloaded, result) = Store::open(&path).unwrap();
        assert_eq!(result, LoadResult::Loaded);
        assert_eq!(shape(reloaded.root()), shape(store.root()));
    }

    /// Rebuild a subtree with ids from another allocator.
    fn reassign(ids: &mut IdAllocator, node: Node) -> Node {
        let Node {
            text,
            kind,
            action,
            icon,
            children,
            ..
        } = node;
        let mut copy = Node::new(ids, kind);
        copy.text = text;
        copy.action = action;
        copy.icon = icon;
        copy.children = children
            .into_iter()
            .map(|child| reassign(ids, child))
            .collect();
        copy
    }

    #[test]
    fn add_appends_last_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(&path).unwrap();

        let work = store.root().id_of("Work");
        let chat = Node::link(store.ids(), "Chat", "https://chat");
        assert!(store.add(work, chat));
        store.save().unwrap();

        let (reloaded, _) = Store::open(&path).unwrap();
        assert_eq!(labels(reloaded.root()), ["Work", "Docs"]);
        let work = reloaded.find(reloaded.root().id_of("Work")).unwrap();
        assert_eq!(labels(work), ["Mail", "Chat"]);
        assert_eq!(work.children()[1].action(), Some("https://chat"));
    }

    #[test]
    fn add_to_root() {
        let mut store = Store::new("unused.xml");
        let root = store.root().id();
        let link = Node::link(store.ids(), "Docs", "https://docs");
        assert!(store.add(root, link));
        assert_eq!(labels(store.root()), ["Docs"]);
    }

    #[test]
    fn add_to_missing_parent_changes_nothing() {
        let mut store = Store::new("unused.xml");
        let root = Node::example(store.ids());
        store.root = root;
        let before = store.root().clone();

        let missing = NodeId(999);
        let link = Node::link(store.ids(), "Lost", "https://lost");
        assert!(!store.add(missing, link));
        assert_eq!(store.root(), &before);
    }

    #[test]
    fn add_rejects_ids_of_another_allocator() {
        let mut store = Store::new("unused.xml");
        let root = store.root().id();
        let mut foreign = IdAllocator::default();
        let group = Node::group(&mut foreign, "Work");
        assert_eq!(group.id(), root);
        assert!(!store.add(root, group));
        assert!(store.root().children().is_empty());

        let mut ahead = IdAllocator::default();
        for _ in 0..10 {
            ahead.allocate();
        }
        assert!(!store.add(root, Node::link(&mut ahead, "Docs", "https://docs")));
        assert!(store.root().children().is_empty());
    }

    #[test]
    fn add_rejects_a_node_twice() {
        let mut store = Store::new("unused.xml");
        let root = store.root().id();
        let link = Node::link(store.ids(), "Docs", "https://docs");
        assert!(store.add(root, link.clone()));
        assert!(!store.add(root, link));
        assert_eq!(labels(store.root()), ["Docs"]);
    }

    #[test]
    fn add_rejects_duplicates_inside_the_subtree() {
        let mut store = Store::new("unused.xml");
        let root = store.root().id();
        let link = Node::link(store.ids(), "Docs", "https://docs");
        let group = Node::group(store.ids(), "Work")
            .with_child(link.clone())
            .with_child(link);
        assert!(!store.add(root, group));
        assert!(store.root().children().is_empty());
    }

    #[test]
    fn delete_group_removes_subtree() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(&path).unwrap();

        let work = store.root().id_of("Work");
        let mail = store.root().id_of("Mail");
        assert!(store.delete(work));
        assert!(store.find(mail).is_none());
        store.save().unwrap();

        let (reloaded, _) = Store::open(&path).unwrap();
        assert_eq!(labels(reloaded.root()), ["Docs"]);
        assert_eq!(reloaded.root().subtree_len(), 2);
    }

    #[test]
    fn delete_leaf_keeps_siblings() {
        let mut store = Store::new("unused.xml");
        store.root = Node::example(store.ids());
        let weather = store.root().id_of("Weather");
        assert!(store.delete(weather));
        let news = store.find(store.root().id_of("News")).unwrap();
        assert!(news.children().is_empty());
        assert_eq!(store.root().subtree_len(), 9);
    }

    #[test]
    fn delete_root_is_impossible() {
        let mut store = Store::new("unused.xml");
        store.root = Node::example(store.ids());
        let before = store.root().clone();
        assert!(!store.delete(store.root().id()));
        assert_eq!(store.root(), &before);
    }

    #[test]
    fn delete_missing_changes_nothing() {
        let mut store = Store::new("unused.xml");
        store.root = Node::example(store.ids());
        let before = store.root().clone();
        assert!(!store.delete(NodeId(12_345)));
        assert_eq!(store.root(), &before);
    }

    #[test]
    fn save_writes_backup_of_previous_version() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(&path).unwrap();

        assert!(store.delete(store.root().id_of("Docs")));
        store.save().unwrap();
        assert_eq!(fs::read_to_string(store.backup_path()).unwrap(), TWO_LEVEL);

        let first_save = fs::read_to_string(&path).unwrap();
        assert!(store.delete(store.root().id_of("Work")));
        store.save().unwrap();
        assert_eq!(fs::read_to_string(store.backup_path()).unwrap(), first_save);
    }

    #[test]
    fn surrounding_whitespace_survives_save() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "");
        let (mut store, _) = Store::open(&path).unwrap();
        let root = store.root().id();
        let mail = Node::link(store.ids(), "  Mail  ", " https://mail ").with_icon(" mail.png ");
        assert!(store.add(root, mail));
        store.save().unwrap();

        let (reloaded, _) = Store::open(&path).unwrap();
        assert_eq!(shape(reloaded.root()), shape(store.root()));
        let mail = &reloaded.root().children()[0];
        assert_eq!(mail.text(), "  Mail  ");
        assert_eq!(mail.action(), Some(" https://mail "));
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let (store, _) = Store::open(&path).unwrap();
        store.save().unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn backup_path_appends_tilde() {
        let store = Store::new("/tmp/bookmarks/lesezeichen.xml");
        assert_eq!(
            store.backup_path(),
            PathBuf::from("/tmp/bookmarks/lesezeichen.xml~")
        );
    }

    #[test]
    fn save_without_existing_file_fails_on_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-created.xml");
        let store = Store::new(&path);
        let err = store.save().unwrap_err();
        assert!(matches!(err, SaveError::Backup { .. }), "{err:?}");
        assert!(!path.exists());
    }

    #[test]
    fn activate_only_links() {
        let mut store = Store::new("unused.xml");
        store.root = Node::example(store.ids());

        let mut opened = Vec::new();
        assert!(store.activate(store.root().id_of("Docs"), |action| {
            opened.push(action.to_owned());
        }));
        assert!(!store.activate(store.root().id_of("Work"), |_| unreachable!()));
        assert!(!store.activate(NodeId(999), |_| unreachable!()));
        assert_eq!(opened, ["https://docs.example.com"]);
    }

    #[test]
    fn filter_scenario_after_load() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, TWO_LEVEL);
        let (mut store, _) = Store::open(&path).unwrap();
        let work = store.root().id_of("Work");
        let chat = Node::link(store.ids(), "Chat", "https://chat");
        assert!(store.add(work, chat));

        let mut rows = store.full_hierarchy();
        Filter::new("").apply(&mut rows);
        assert!(rows.preorder().iter().all(|row| row.visible));

        Filter::new("mail").apply(&mut rows);
        let visible = rows
            .preorder()
            .into_iter()
            .filter(|row| row.visible)
            .map(|row| row.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(visible, ["Root", "Work", "Mail"]);
    }
}
