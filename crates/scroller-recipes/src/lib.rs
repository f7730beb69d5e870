//! # Scroller Recipes
//!
//! A fixed-size store of user-defined crafting recipes with one selected
//! slot, persisted per world or per server.
//!
//! This crate provides:
//! - [`CraftingRecipe`]: one captured ingredient grid plus its output
//! - [`RecipeStore`]: the slots, the selection cursor and disk persistence
//! - [`ContainerSnapshot`]: what the host supplies when a recipe is captured
//! - [`StorageContext`]: which file a store reads and writes
//! - [`StoreConfig`]: TOML configuration
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use scroller_recipes::{RecipeStore, StorageContext};
//!
//! let dir = Path::new("/games/minecraft/itemscroller");
//! let context = StorageContext::local_world("New World");
//!
//! let mut store = RecipeStore::new(18, false);
//! store.read_from_disk(dir, &context);
//! store.scroll_selection(true);
//! store.write_to_disk(dir, &context);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod container;
pub mod context;
pub mod crafting_recipe;
pub mod error;
pub mod item_stack;
pub mod storage;

pub use config::StoreConfig;
pub use container::{CapturedContainer, ContainerSnapshot, SlotRange, SlotRef};
pub use context::StorageContext;
pub use crafting_recipe::CraftingRecipe;
pub use error::{StoreError, StoreResult};
pub use item_stack::ItemStack;
pub use storage::RecipeStore;
