//! Recipe slot store.
//!
//! This module provides:
//! - A fixed number of recipe slots with one selected slot
//! - Bounds-safe selection and lookup (bad indices never fail)
//! - Dirty tracking so unchanged stores are never rewritten
//! - Atomic saves (temp file + rename) of a gzip tag document
//!
//! File layout:
//!
//! ```text
//! {
//!     Recipes: [ { RecipeIndex: Byte, ..recipe record.. }, ... ],
//!     Selected: Byte,
//! }
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use scroller_common::nbt::{self, Compound, List};
use tracing::{debug, warn};

use crate::container::{ContainerSnapshot, SlotRef};
use crate::context::StorageContext;
use crate::crafting_recipe::{CraftingRecipe, DEFAULT_GRID_SLOTS};
use crate::error::{StoreError, StoreResult};

/// Highest slot index the one-byte `RecipeIndex` field can hold.
pub const MAX_PERSISTED_INDEX: usize = u8::MAX as usize;

/// Owns the recipe slots, the selection cursor and the dirty flag.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    /// Recipe slots. Never empty.
    recipes: Vec<CraftingRecipe>,
    /// Selected slot, always a valid index into `recipes`.
    selected: usize,
    /// Unsaved changes since the last successful write.
    dirty: bool,
    /// Use one shared file instead of one per world/server.
    global: bool,
}

impl RecipeStore {
    /// Creates a store with `recipe_count` empty 3x3 recipes.
    ///
    /// A count of zero is raised to one so lookups always have a slot to
    /// fall back to.
    #[must_use]
    pub fn new(recipe_count: usize, global: bool) -> Self {
        Self::with_grid_slots(recipe_count, DEFAULT_GRID_SLOTS, global)
    }

    /// Creates a store whose empty recipes have `grid_slots` ingredient slots.
    #[must_use]
    pub fn with_grid_slots(recipe_count: usize, grid_slots: usize, global: bool) -> Self {
        if recipe_count == 0 {
            warn!("Recipe store needs at least one slot, using 1");
        }

        Self {
            recipes: vec![CraftingRecipe::new(grid_slots); recipe_count.max(1)],
            selected: 0,
            dirty: false,
            global,
        }
    }

    /// Number of recipe slots.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the store uses the shared global file.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.global
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Selected slot index.
    #[must_use]
    pub const fn selection(&self) -> usize {
        self.selected
    }

    /// Selects `index` if it is a valid slot; otherwise does nothing.
    pub fn change_selected_recipe(&mut self, index: usize) {
        if index < self.recipes.len() {
            self.selected = index;
            self.dirty = true;
        }
    }

    /// Moves the selection one slot forward or back, stopping at either end.
    pub fn scroll_selection(&mut self, forward: bool) {
        let next = if forward {
            self.selected.checked_add(1)
        } else {
            self.selected.checked_sub(1)
        };

        if let Some(index) = next {
            self.change_selected_recipe(index);
        }
    }

    /// Slot `index` if it exists, slot 0 otherwise.
    fn slot(&self, index: usize) -> usize {
        if index < self.recipes.len() {
            index
        } else {
            0
        }
    }

    /// Returns the recipe at `index`, or the first recipe if `index` is out
    /// of range.
    #[must_use]
    pub fn get_recipe(&self, index: usize) -> &CraftingRecipe {
        &self.recipes[self.slot(index)]
    }

    /// Returns the selected recipe.
    #[must_use]
    pub fn get_selected_recipe(&self) -> &CraftingRecipe {
        self.get_recipe(self.selected)
    }

    /// Iterates over all slots in order.
    pub fn recipes(&self) -> impl Iterator<Item = &CraftingRecipe> {
        self.recipes.iter()
    }

    /// Captures a recipe from `container` into the selected slot.
    pub fn store_crafting_recipe_to_current_selection(
        &mut self,
        source: SlotRef,
        container: &dyn ContainerSnapshot,
        clear_if_empty: bool,
    ) {
        self.store_crafting_recipe(self.selected, source, container, clear_if_empty);
    }

    /// Captures a recipe from `container` into slot `index` (slot 0 if out of
    /// range).
    pub fn store_crafting_recipe(
        &mut self,
        index: usize,
        source: SlotRef,
        container: &dyn ContainerSnapshot,
        clear_if_empty: bool,
    ) {
        let slot = self.slot(index);
        self.recipes[slot].store_from_container(source, container, clear_if_empty);
        self.dirty = true;
    }

    /// Replaces slot `index` (slot 0 if out of range) with `recipe`.
    pub fn set_recipe(&mut self, index: usize, recipe: CraftingRecipe) {
        let slot = self.slot(index);
        self.recipes[slot] = recipe;
        self.dirty = true;
    }

    /// Clears slot `index` (slot 0 if out of range).
    pub fn clear_recipe(&mut self, index: usize) {
        let slot = self.slot(index);
        self.recipes[slot].clear();
        self.dirty = true;
    }

    /// Encodes the store. Only valid recipes are written.
    #[must_use]
    pub fn to_nbt(&self) -> Compound {
        let records = self
            .recipes
            .iter()
            .enumerate()
            .filter(|(_, recipe)| recipe.is_valid())
            .filter_map(|(index, recipe)| {
                if index > MAX_PERSISTED_INDEX {
                    warn!("Recipe slot {} cannot be saved, files hold slots 0-255", index);
                    return None;
                }
                let mut tag = Compound::new();
                tag.put_byte("RecipeIndex", index as u8 as i8);
                recipe.write_nbt(&mut tag);
                Some(tag)
            });

        let mut root = Compound::new();
        root.insert("Recipes", List::from_compounds(records));
        let selected = if self.selected > MAX_PERSISTED_INDEX {
            0
        } else {
            self.selected as u8
        };
        root.put_byte("Selected", selected as i8);
        root
    }

    /// Replaces every slot and the selection with the contents of `root`.
    ///
    /// Records for slots this store does not have are dropped, and a record
    /// without a `RecipeIndex` goes to slot 0. The selection
    /// goes through [`change_selected_recipe`](Self::change_selected_recipe),
    /// so a stale value cannot leave the cursor out of range. The store is
    /// clean afterwards.
    pub fn load_nbt(&mut self, root: &Compound) -> StoreResult<()> {
        let Some(records) = root.get_list("Recipes") else {
            return Err(StoreError::MissingRecipes);
        };

        for recipe in &mut self.recipes {
            recipe.clear();
        }

        for record in records.compounds() {
            let index = record.get_byte("RecipeIndex").unwrap_or(0) as u8 as usize;
            match self.recipes.get_mut(index) {
                Some(recipe) => {
                    recipe.read_nbt(record);
                }
                None => debug!(
                    "Dropping stored recipe {} (store has {} slots)",
                    index,
                    self.recipes.len()
                ),
            }
        }

        let selected = root.get_byte("Selected").unwrap_or(0) as u8 as usize;
        self.change_selected_recipe(selected);
        // Memory now matches the file; restoring the selection is not a change.
        self.dirty = false;
        Ok(())
    }

    /// Loads the recipe file for `context` from `dir`.
    ///
    /// Returns `true` if a file was loaded. A missing, unreadable or corrupt
    /// file leaves the store unchanged; failures are logged.
    pub fn read_from_disk(&mut self, dir: &Path, context: &StorageContext) -> bool {
        let path = context.file_path(dir, self.global);

        match self.try_read(&path) {
            Ok(true) => {
                debug!("Read recipes from file '{}'", path.display());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Failed to read recipes from file '{}': {}", path.display(), e);
                false
            }
        }
    }

    fn try_read(&mut self, path: &Path) -> StoreResult<bool> {
        if !path.is_file() {
            return Ok(false);
        }

        let file = File::open(path)?;
        let root = nbt::read_compressed(BufReader::new(file))?;
        self.load_nbt(&root)?;
        Ok(true)
    }

    /// Saves the store to the recipe file for `context` in `dir`, if dirty.
    ///
    /// Returns `true` if a file was written. The dirty flag is only cleared
    /// on success, so a failed save is retried by the next call.
    pub fn write_to_disk(&mut self, dir: &Path, context: &StorageContext) -> bool {
        if !self.dirty {
            return false;
        }

        match self.try_write(dir, context) {
            Ok(path) => {
                self.dirty = false;
                debug!("Wrote recipes to file '{}'", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to write recipes to file: {}", e);
                false
            }
        }
    }

    /// Performs atomic write (temp file + rename).
    fn try_write(&self, dir: &Path, context: &StorageContext) -> StoreResult<PathBuf> {
        if !dir.is_dir() {
            fs::create_dir_all(dir).map_err(|source| StoreError::DirectoryUnavailable {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let temp_path = context.temp_path(dir, self.global);
        let final_path = context.file_path(dir, self.global);

        // Rename replaces any existing file in one step.
        let result = Self::write_temp(&self.to_nbt(), &temp_path)
            .and_then(|()| fs::rename(&temp_path, &final_path).map_err(StoreError::from));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(final_path)
    }

    fn write_temp(root: &Compound, path: &Path) -> StoreResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        nbt::write_compressed(root, &mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{CapturedContainer, SlotRange};
    use crate::item_stack::ItemStack;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn recipe_with(item: &str, count: u8) -> CraftingRecipe {
        let mut recipe = CraftingRecipe::default();
        recipe.set_ingredient(0, Some(ItemStack::new(item, count)));
        recipe.set_result(Some(ItemStack::new("minecraft:chest", 1)));
        recipe
    }

    fn workbench() -> CapturedContainer {
        let mut container = CapturedContainer::new(10)
            .with_crafting_area(SlotRef(0), SlotRange::new(1, 9));
        container.set(SlotRef(0), Some(ItemStack::new("minecraft:stick", 4)));
        container.set(SlotRef(1), Some(ItemStack::new("minecraft:oak_planks", 1)));
        container.set(SlotRef(4), Some(ItemStack::new("minecraft:oak_planks", 1)));
        container
    }

    #[test]
    fn test_new_store() {
        for count in [1, 5, 18, 300] {
            let store = RecipeStore::new(count, false);
            assert_eq!(store.recipe_count(), count);
            assert_eq!(store.selection(), 0);
            assert!(!store.is_dirty());
            assert!(store.recipes().all(|r| !r.is_valid()));
        }
    }

    #[test]
    fn test_zero_count_raised_to_one() {
        let store = RecipeStore::new(0, true);
        assert_eq!(store.recipe_count(), 1);
        assert!(store.is_global());
    }

    #[test]
    fn test_get_recipe_falls_back_to_first() {
        let mut store = RecipeStore::new(3, false);
        store.set_recipe(0, recipe_with("minecraft:dirt", 1));

        assert_eq!(store.get_recipe(3), store.get_recipe(0));
        assert_eq!(store.get_recipe(usize::MAX), store.get_recipe(0));
        assert!(!store.get_recipe(2).is_valid());
    }

    #[test]
    fn test_change_selected_recipe() {
        let mut store = RecipeStore::new(5, false);

        store.change_selected_recipe(7);
        assert_eq!(store.selection(), 0);
        assert!(!store.is_dirty());

        store.change_selected_recipe(4);
        assert_eq!(store.selection(), 4);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_scroll_stops_at_ends() {
        let mut store = RecipeStore::new(3, false);

        store.scroll_selection(false);
        assert_eq!(store.selection(), 0);
        assert!(!store.is_dirty());

        store.scroll_selection(true);
        store.scroll_selection(true);
        assert_eq!(store.selection(), 2);

        store.scroll_selection(true);
        assert_eq!(store.selection(), 2);

        store.scroll_selection(false);
        assert_eq!(store.selection(), 1);
    }

    #[test]
    fn test_store_to_current_selection() {
        let mut store = RecipeStore::new(4, false);
        store.change_selected_recipe(2);

        store.store_crafting_recipe_to_current_selection(SlotRef(0), &workbench(), true);

        let recipe = store.get_selected_recipe();
        assert!(recipe.is_valid());
        assert_eq!(recipe.result().map(|s| s.count), Some(4));
        assert!(!store.get_recipe(0).is_valid());
    }

    #[test]
    fn test_store_out_of_range_targets_first() {
        let mut store = RecipeStore::new(2, false);
        store.store_crafting_recipe(9, SlotRef(0), &workbench(), true);

        assert!(store.get_recipe(0).is_valid());
        assert!(!store.get_recipe(1).is_valid());
        assert!(store.is_dirty());
    }

    #[test]
    fn test_clear_recipe() {
        let mut store = RecipeStore::new(2, false);
        store.set_recipe(1, recipe_with("minecraft:sand", 4));
        assert_eq!(store.to_nbt().get_list("Recipes").map(List::len), Some(1));

        store.clear_recipe(1);
        assert!(!store.get_recipe(1).is_valid());
        assert!(store.is_dirty());
        assert_eq!(store.to_nbt().get_list("Recipes").map(List::len), Some(0));
    }

    #[test]
    fn test_to_nbt_layout() {
        let mut store = RecipeStore::new(200, false);
        store.set_recipe(150, recipe_with("minecraft:gravel", 1));
        store.change_selected_recipe(150);

        let root = store.to_nbt();
        let records = root.get_list("Recipes").expect("recipes");
        assert_eq!(records.len(), 1);
        let record = records.compounds().next().expect("record");
        assert_eq!(record.get_byte("RecipeIndex"), Some(150u8 as i8));
        assert_eq!(root.get_byte("Selected"), Some(150u8 as i8));

        let mut loaded = RecipeStore::new(200, false);
        loaded.load_nbt(&root).expect("load");
        assert_eq!(loaded.selection(), 150);
        assert_eq!(loaded.get_recipe(150), store.get_recipe(150));
    }

    #[test]
    fn test_to_nbt_skips_unpersistable_slots() {
        let mut store = RecipeStore::new(300, false);
        store.set_recipe(255, recipe_with("minecraft:clay", 1));
        store.set_recipe(256, recipe_with("minecraft:clay", 2));

        let root = store.to_nbt();
        assert_eq!(root.get_list("Recipes").map(List::len), Some(1));
    }

    #[test]
    fn test_load_replaces_everything() {
        let mut source = RecipeStore::new(4, false);
        source.set_recipe(1, recipe_with("minecraft:stone", 2));
        let root = source.to_nbt();

        let mut target = RecipeStore::new(4, false);
        target.set_recipe(3, recipe_with("minecraft:glass", 8));
        target.change_selected_recipe(3);

        target.load_nbt(&root).expect("load");
        assert!(!target.get_recipe(3).is_valid());
        assert!(target.get_recipe(1).is_valid());
        assert_eq!(target.selection(), 0);
        assert!(!target.is_dirty());
    }

    #[test]
    fn test_load_drops_foreign_indices_and_selection() {
        let mut big = RecipeStore::new(10, false);
        big.set_recipe(2, recipe_with("minecraft:iron_ingot", 3));
        big.set_recipe(8, recipe_with("minecraft:gold_ingot", 3));
        big.change_selected_recipe(8);
        let root = big.to_nbt();

        let mut small = RecipeStore::new(4, false);
        small.change_selected_recipe(1);
        small.load_nbt(&root).expect("load");

        assert!(small.get_recipe(2).is_valid());
        assert_eq!(small.recipes().filter(|r| r.is_valid()).count(), 1);
        // Selection 8 is out of range for 4 slots and is ignored.
        assert_eq!(small.selection(), 1);
    }

    #[test]
    fn test_load_record_without_index_goes_to_first_slot() {
        let mut record = Compound::new();
        recipe_with("minecraft:glowstone_dust", 4).write_nbt(&mut record);
        let mut root = Compound::new();
        root.insert("Recipes", List::from_compounds([record]));

        let mut store = RecipeStore::new(3, false);
        store.load_nbt(&root).expect("load");

        assert_eq!(store.get_recipe(0), &recipe_with("minecraft:glowstone_dust", 4));
        assert_eq!(store.selection(), 0);
    }

    #[test]
    fn test_load_without_recipes_is_error() {
        let mut store = RecipeStore::new(2, false);
        store.set_recipe(0, recipe_with("minecraft:wool", 1));

        let mut root = Compound::new();
        root.put_byte("Selected", 1);
        assert!(matches!(store.load_nbt(&root), Err(StoreError::MissingRecipes)));
        assert!(store.get_recipe(0).is_valid());
        assert_eq!(store.selection(), 0);
    }

    #[test]
    fn test_write_is_gated_by_dirty_flag() {
        let dir = TempDir::new().expect("temp dir");
        let ctx = StorageContext::None;
        let mut store = RecipeStore::new(3, true);

        // Clean store writes nothing.
        assert!(!store.write_to_disk(dir.path(), &ctx));
        assert!(!ctx.file_path(dir.path(), true).exists());

        store.set_recipe(1, recipe_with("minecraft:flint", 1));
        assert!(store.write_to_disk(dir.path(), &ctx));
        assert!(!store.is_dirty());

        let path = ctx.file_path(dir.path(), true);
        fs::remove_file(&path).expect("remove");
        assert!(!store.write_to_disk(dir.path(), &ctx));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_creates_directory_and_no_temp_file() {
        let dir = TempDir::new().expect("temp dir");
        let save_dir = dir.path().join("nested").join("itemscroller");
        let ctx = StorageContext::remote("play.example.org:25565");
        let mut store = RecipeStore::new(3, false);
        store.set_recipe(0, recipe_with("minecraft:string", 3));

        assert!(store.write_to_disk(&save_dir, &ctx));
        assert!(save_dir.join("recipes_play.example.org_25565.nbt").is_file());
        assert!(!ctx.temp_path(&save_dir, false).exists());
    }

    #[test]
    fn test_failed_write_keeps_dirty() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"file").expect("write blocker");

        let mut store = RecipeStore::new(2, false);
        store.set_recipe(0, recipe_with("minecraft:feather", 1));

        assert!(!store.write_to_disk(&blocker, &StorageContext::None));
        assert!(store.is_dirty());

        // Retried on the next call once the directory is usable.
        assert!(store.write_to_disk(dir.path(), &StorageContext::None));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().expect("temp dir");
        let ctx = StorageContext::local_world("w");
        let target = ctx.file_path(dir.path(), false);
        fs::create_dir(&target).expect("dir at target");
        fs::write(target.join("keep"), b"x").expect("fill dir");

        let mut store = RecipeStore::new(2, false);
        store.set_recipe(0, recipe_with("minecraft:torch", 4));

        assert!(!store.write_to_disk(dir.path(), &ctx));
        assert!(store.is_dirty());
        assert!(!ctx.temp_path(dir.path(), false).exists());
    }

    #[test]
    fn test_read_missing_file_keeps_state() {
        let dir = TempDir::new().expect("temp dir");
        let mut store = RecipeStore::new(2, false);
        store.set_recipe(1, recipe_with("minecraft:egg", 1));

        assert!(!store.read_from_disk(dir.path(), &StorageContext::local_world("w")));
        assert!(store.get_recipe(1).is_valid());
        assert!(store.is_dirty());
    }

    #[test]
    fn test_read_corrupt_file_keeps_state() {
        let dir = TempDir::new().expect("temp dir");
        let ctx = StorageContext::local_world("broken");
        fs::write(ctx.file_path(dir.path(), false), b"\x1f\x8bgarbage").expect("write");

        let mut store = RecipeStore::new(2, false);
        store.set_recipe(1, recipe_with("minecraft:egg", 1));
        store.change_selected_recipe(1);

        assert!(!store.read_from_disk(dir.path(), &ctx));
        assert!(store.get_recipe(1).is_valid());
        assert_eq!(store.selection(), 1);
    }

    #[test]
    fn test_contexts_use_separate_files() {
        let dir = TempDir::new().expect("temp dir");
        let world_a = StorageContext::local_world("a");
        let world_b = StorageContext::local_world("b");

        let mut store = RecipeStore::new(2, false);
        store.set_recipe(0, recipe_with("minecraft:kelp", 1));
        assert!(store.write_to_disk(dir.path(), &world_a));

        let mut other = RecipeStore::new(2, false);
        assert!(!other.read_from_disk(dir.path(), &world_b));
        assert!(other.read_from_disk(dir.path(), &world_a));
        assert!(other.get_recipe(0).is_valid());
    }

    const ITEMS: [&str; 4] = [
        "minecraft:stone",
        "minecraft:diamond",
        "minecraft:iron_sword",
        "minecraft:redstone",
    ];

    proptest! {
        #[test]
        fn prop_store_round_trip(
            count in 1usize..24,
            contents in proptest::collection::vec(
                (
                    0usize..24,
                    proptest::collection::vec(
                        (0usize..9, 0usize..4, 1u8..=64, proptest::option::of(any::<i32>())),
                        0..6,
                    ),
                    proptest::option::of((0usize..4, 1u8..=64)),
                ),
                0..12,
            ),
            selected in 0usize..24,
        ) {
            let mut store = RecipeStore::new(count, false);
            for (index, ingredients, result) in contents {
                let mut recipe = CraftingRecipe::default();
                for (slot, item, amount, damage) in ingredients {
                    let mut stack = ItemStack::new(ITEMS[item], amount);
                    if let Some(damage) = damage {
                        let mut tag = Compound::new();
                        tag.put_int("Damage", damage);
                        stack = stack.with_tag(tag);
                    }
                    recipe.set_ingredient(slot, Some(stack));
                }
                recipe.set_result(result.map(|(item, amount)| ItemStack::new(ITEMS[item], amount)));
                store.set_recipe(index, recipe);
            }
            store.change_selected_recipe(selected);

            let mut loaded = RecipeStore::new(count, false);
            prop_assert!(loaded.load_nbt(&store.to_nbt()).is_ok());

            prop_assert_eq!(loaded.selection(), store.selection());
            for index in 0..count {
                let saved = store.get_recipe(index);
                if saved.is_valid() {
                    prop_assert_eq!(loaded.get_recipe(index), saved);
                } else {
                    prop_assert!(!loaded.get_recipe(index).is_valid());
                }
            }
        }

        #[test]
        fn prop_selection_stays_in_bounds(
            count in 1usize..40,
            ops in proptest::collection::vec((any::<bool>(), 0usize..64, any::<bool>()), 0..64),
        ) {
            let mut store = RecipeStore::new(count, false);
            for (scroll, index, forward) in ops {
                let before = store.selection();
                if scroll {
                    store.scroll_selection(forward);
                } else {
                    store.change_selected_recipe(index);
                    if index < count {
                        prop_assert_eq!(store.selection(), index);
                    } else {
                        prop_assert_eq!(store.selection(), before);
                    }
                }
                prop_assert!(store.selection() < count);
            }
        }
    }
}
