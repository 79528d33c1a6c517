//! Where the bookmarks live and how the search behaves.
//!
//! Settings are read from `config.toml` inside the configuration directory.
//! Every field is optional:
//!
//! ```toml
//! [general]
//! file_name = "lesezeichen.xml"
//! image_dir = "${CONFIG_DIR}/logos"
//!
//! [filter]
//! show_subtrees_of_matches = false
//! ```

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SettingsError;

pub const APP_NAME: &str = "WebsiteIndicator";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_FILE_NAME: &str = "lesezeichen.xml";
const DEFAULT_IMAGE_DIR: &str = "logos";
const CONFIG_DIR_VARIABLE: &str = "${CONFIG_DIR}";

/// The per-user configuration directory of this application when it exists, `fallback` otherwise.
#[must_use]
pub fn config_dir(fallback: &Path) -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| fallback.to_path_buf())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub general: General,
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct General {
    /// Bookmark file, relative to the configuration directory.
    pub file_name: String,
    /// Directory of the icons. `${CONFIG_DIR}` is replaced, defaults to `logos` in the configuration directory.
    pub image_dir: Option<String>,
}

impl Default for General {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_owned(),
            image_dir: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    pub show_subtrees_of_matches: bool,
}

impl Settings {
    /// # Errors
    ///
    /// Errors when the TOML is invalid or contains unknown keys.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(toml)?)
    }

    /// Read [`CONFIG_FILE`] from `config_dir`. A missing file results in the defaults.
    ///
    /// # Errors
    ///
    /// Errors when the file exists but can not be read or parsed.
    pub fn load(config_dir: &Path) -> Result<Self, SettingsError> {
        let path = config_dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loading settings");
                Self::from_toml(&content)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Read { path, source }),
        }
    }

    #[must_use]
    pub fn resolve(&self, config_dir: &Path) -> Paths {
        let image_dir = self.general.image_dir.as_ref().map_or_else(
            || config_dir.join(DEFAULT_IMAGE_DIR),
            |dir| {
                let config_dir = config_dir.to_string_lossy();
                PathBuf::from(dir.replace(CONFIG_DIR_VARIABLE, &config_dir))
            },
        );
        Paths {
            config_dir: config_dir.to_path_buf(),
            file_path: config_dir.join(&self.general.file_name),
            image_dir,
        }
    }
}

/// Locations resolved from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub file_path: PathBuf,
    pub image_dir: PathBuf,
}

impl Paths {
    /// Location of an icon as stored in a [`Node`](crate::Node).
    #[must_use]
    pub fn icon(&self, stored: &str) -> PathBuf {
        self.image_dir.join(stored)
    }

    /// Copy `source` into the image directory and return the name to store in a [`Node`](crate::Node).
    ///
    /// The image directory is created when missing.
    /// Importing an image that already is in the image directory only returns its name.
    ///
    /// # Errors
    ///
    /// Errors when `source` has no file name or copying fails.
    pub fn import_icon(&self, source: &Path) -> io::Result<String> {
        let name = source
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", source.display()),
                )
            })?
            .to_owned();

        fs::create_dir_all(&self.image_dir)?;
        let target = self.image_dir.join(&name);
        if target.exists() && fs::canonicalize(&target)? == fs::canonicalize(source)? {
            return Ok(name);
        }
        fs::copy(source, &target)?;
        tracing::debug!(from = %source.display(), to = %target.display(), "imported icon");
        Ok(name)
    }
}
