//! Storage context and file naming.
//!
//! Recipes are kept per world or per server unless the store is global. The
//! caller resolves which one is active and passes it in on every load/save.

use std::path::{Path, PathBuf};

/// File used in global mode, and whenever no context is active.
pub const GLOBAL_FILE_NAME: &str = "recipes.nbt";

/// Default storage subdirectory under the host data directory.
pub const DEFAULT_STORAGE_DIR: &str = "itemscroller";

/// Suffix of the temporary file written before the atomic rename.
pub const TEMP_SUFFIX: &str = ".tmp";

/// The connection the recipes belong to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageContext {
    /// Not in a world.
    #[default]
    None,
    /// Single-player world, by save folder name.
    LocalWorld(String),
    /// Multiplayer server, by address (`host` or `host:port`).
    Remote(String),
}

impl StorageContext {
    /// A single-player world context.
    #[must_use]
    pub fn local_world(folder: impl Into<String>) -> Self {
        Self::LocalWorld(folder.into())
    }

    /// A remote server context.
    #[must_use]
    pub fn remote(address: impl Into<String>) -> Self {
        Self::Remote(address.into())
    }

    /// File name for this context.
    ///
    /// Global stores always use [`GLOBAL_FILE_NAME`]. Otherwise the world
    /// folder or server address is embedded, with `:` replaced by `_`. A
    /// blank folder or address counts as no context.
    #[must_use]
    pub fn file_name(&self, global: bool) -> String {
        if global {
            return GLOBAL_FILE_NAME.to_string();
        }

        match self {
            Self::LocalWorld(folder) if !folder.is_empty() => format!("recipes_{folder}.nbt"),
            Self::Remote(address) if !address.is_empty() => {
                format!("recipes_{}.nbt", address.replace(':', "_"))
            }
            _ => GLOBAL_FILE_NAME.to_string(),
        }
    }

    /// Full path of the recipe file inside `dir`.
    #[must_use]
    pub fn file_path(&self, dir: &Path, global: bool) -> PathBuf {
        dir.join(self.file_name(global))
    }

    /// Path of the temporary file used while saving.
    #[must_use]
    pub fn temp_path(&self, dir: &Path, global: bool) -> PathBuf {
        dir.join(format!("{}{TEMP_SUFFIX}", self.file_name(global)))
    }
}

/// Recipe storage directory under the host's data directory.
#[must_use]
pub fn storage_dir(data_dir: &Path, dir_name: &str) -> PathBuf {
    data_dir.join(dir_name)
}
