//! Store configuration.
//!
//! Controls how many recipe slots exist, the grid size of new recipes,
//! whether one file is shared across worlds, and where files live.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::context::{storage_dir, DEFAULT_STORAGE_DIR};
use crate::crafting_recipe::{DEFAULT_GRID_SLOTS, MAX_GRID_SLOTS};
use crate::storage::{RecipeStore, MAX_PERSISTED_INDEX};

/// Default number of recipe slots.
pub const DEFAULT_RECIPE_COUNT: usize = 18;

/// Recipe store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of recipe slots (1-256)
    pub recipe_count: usize,
    /// Ingredient slots of a fresh recipe (1-81)
    pub grid_slots: usize,
    /// Share one recipe file across all worlds and servers
    pub global: bool,
    /// Subdirectory of the data directory holding recipe files
    pub storage_dir_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            recipe_count: DEFAULT_RECIPE_COUNT,
            grid_slots: DEFAULT_GRID_SLOTS,
            global: false,
            storage_dir_name: DEFAULT_STORAGE_DIR.to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        config.validate();
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Slot indices are stored as one byte.
        self.recipe_count = self.recipe_count.clamp(1, MAX_PERSISTED_INDEX + 1);
        self.grid_slots = self.grid_slots.clamp(1, MAX_GRID_SLOTS);

        if self.storage_dir_name.trim().is_empty() {
            self.storage_dir_name = DEFAULT_STORAGE_DIR.to_string();
        }
    }

    /// Recipe directory under `data_dir`.
    #[must_use]
    pub fn storage_dir(&self, data_dir: &Path) -> PathBuf {
        storage_dir(data_dir, &self.storage_dir_name)
    }

    /// Creates an empty store with this configuration.
    #[must_use]
    pub fn build_store(&self) -> RecipeStore {
        RecipeStore::with_grid_slots(self.recipe_count, self.grid_slots, self.global)
    }
}
