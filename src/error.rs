use std::io;
use std::path::PathBuf;

/// The bookmark file could not be turned into a tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("the document has no <menu> root element")]
    MissingRoot,

    #[error("the document ends inside <{0}>")]
    UnexpectedEof(&'static str),
}

/// The tree could not be written back.
///
/// The in-memory tree and the file on disk may differ afterwards.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to serialize the bookmarks: {0}")]
    Serialize(#[from] quick_xml::Error),

    #[error("failed to back up {} to {}: {source}", .from.display(), .to.display())]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// User input for a new entry is incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title must contain at least 3 characters.")]
    TitleTooShort,

    #[error("Please select an entry type.")]
    MissingKind,

    #[error("URL required.")]
    MissingUrl,

    #[error("Please select a parent menu entry.")]
    MissingParent,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}
