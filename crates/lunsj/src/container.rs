//! The directory shared by every process that shows the menu.
//!
//! It is opened once at startup and handed to the menu service and the
//! settings store instead of being looked up globally.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tempfile::NamedTempFile;

use crate::cache::CacheStore;
use crate::settings::SettingsStore;

const CACHE_DIR_NAME: &str = "caches";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("No data directory is available on this platform")]
    Unavailable,
    #[error("Data directory {path} is not usable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SharedContainer {
    root: PathBuf,
    cache: CacheStore,
    settings: SettingsStore,
}

impl SharedContainer {
    /// Opens the platform data directory, e.g. `~/.local/share/lunsj` on Linux.
    pub fn open_default() -> Result<Self, ContainerError> {
        let project_dirs = ProjectDirs::from("no", "", "lunsj").ok_or(ContainerError::Unavailable)?;
        Self::open(project_dirs.data_dir())
    }

    pub fn open(root: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let root = root.as_ref().to_path_buf();
        let cache_dir = root.join(CACHE_DIR_NAME);
        fs::create_dir_all(&cache_dir).map_err(|source| ContainerError::Io {
            path: cache_dir.clone(),
            source,
        })?;
        log::debug!("Using data directory {}", root.display());

        Ok(Self {
            cache: CacheStore::new(cache_dir),
            settings: SettingsStore::new(root.join(SETTINGS_FILE_NAME)),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

/// Writes `contents` to a temporary file next to `path` and renames it into
/// place, so readers see either the old or the new file.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
