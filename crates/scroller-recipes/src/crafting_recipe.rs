//! A single stored crafting pattern.
//!
//! A recipe is a grid of ingredient slots plus an output slot. It is captured
//! from a container snapshot, and encoded sparsely: only occupied ingredient
//! positions are written.
//!
//! Record layout:
//!
//! ```text
//! {
//!     Length: Int,              // grid size the recipe was captured from
//!     Result: Compound,         // output stack (empty compound if none)
//!     Ingredients: [            // occupied positions only
//!         { Slot: Int, id: String, Count: Byte, tag?: Compound },
//!         ...
//!     ],
//! }
//! ```

use scroller_common::nbt::{self, Compound, List, TagType};
use scroller_common::NbtResult;
use tracing::{debug, warn};

use crate::container::{ContainerSnapshot, SlotRef};
use crate::item_stack::ItemStack;

/// Ingredient slots of a 3x3 crafting grid.
pub const DEFAULT_GRID_SLOTS: usize = 9;

/// Largest supported grid (9x9).
pub const MAX_GRID_SLOTS: usize = 81;

/// A stored crafting recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftingRecipe {
    /// Ingredient grid in row-major order.
    ingredients: Vec<Option<ItemStack>>,
    /// Output stack.
    result: Option<ItemStack>,
}

impl Default for CraftingRecipe {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SLOTS)
    }
}

impl CraftingRecipe {
    /// Creates an empty recipe with `grid_slots` ingredient positions.
    #[must_use]
    pub fn new(grid_slots: usize) -> Self {
        Self {
            ingredients: vec![None; grid_slots.clamp(1, MAX_GRID_SLOTS)],
            result: None,
        }
    }

    /// Number of ingredient positions.
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.ingredients.len()
    }

    /// All ingredient positions.
    #[must_use]
    pub fn ingredients(&self) -> &[Option<ItemStack>] {
        &self.ingredients
    }

    /// Ingredient at `slot`.
    #[must_use]
    pub fn ingredient(&self, slot: usize) -> Option<&ItemStack> {
        self.ingredients.get(slot)?.as_ref()
    }

    /// Output stack.
    #[must_use]
    pub fn result(&self) -> Option<&ItemStack> {
        self.result.as_ref()
    }

    /// Sets an ingredient. Returns `false` if `slot` is outside the grid.
    pub fn set_ingredient(&mut self, slot: usize, stack: Option<ItemStack>) -> bool {
        match self.ingredients.get_mut(slot) {
            Some(entry) => {
                *entry = stack.filter(|s| !s.is_empty());
                true
            }
            None => false,
        }
    }

    /// Sets the output stack.
    pub fn set_result(&mut self, stack: Option<ItemStack>) {
        self.result = stack.filter(|s| !s.is_empty());
    }

    /// A recipe is worth keeping once any ingredient slot is occupied.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ingredients.iter().any(Option::is_some)
    }

    /// Empties every ingredient slot and the output slot.
    pub fn clear(&mut self) {
        self.ingredients.fill(None);
        self.result = None;
    }

    fn resize_and_clear(&mut self, grid_slots: usize) {
        let grid_slots = grid_slots.clamp(1, MAX_GRID_SLOTS);
        if self.ingredients.len() != grid_slots {
            self.ingredients = vec![None; grid_slots];
        }
        self.clear();
    }

    /// Captures the recipe currently laid out in a crafting grid.
    ///
    /// `source` is the output slot that was clicked. If the snapshot knows no
    /// crafting grid behind it, nothing happens. If the output slot is empty,
    /// the recipe is cleared when `clear_if_empty` is set and kept otherwise.
    pub fn store_from_container(
        &mut self,
        source: SlotRef,
        container: &dyn ContainerSnapshot,
        clear_if_empty: bool,
    ) {
        let Some(range) = container.crafting_range(source) else {
            debug!("Slot {} has no crafting grid", source.index());
            return;
        };

        let Some(result) = container.stack(source).filter(|s| !s.is_empty()) else {
            if clear_if_empty {
                self.clear();
            }
            return;
        };

        self.resize_and_clear(range.count());

        let slot_count = container.slot_count();
        for (i, slot) in range.slots().enumerate().take(self.ingredients.len()) {
            if slot >= slot_count {
                break;
            }
            self.ingredients[i] = container.stack(SlotRef(slot)).filter(|s| !s.is_empty());
        }

        self.result = Some(result);
    }

    /// Writes the record into `nbt`. Invalid recipes write nothing.
    pub fn write_nbt(&self, nbt: &mut Compound) {
        if !self.is_valid() {
            return;
        }

        let ingredients = self
            .ingredients
            .iter()
            .enumerate()
            .filter_map(|(slot, stack)| {
                let stack = stack.as_ref()?;
                let mut entry = Compound::new();
                entry.put_int("Slot", slot as i32);
                stack.write_nbt(&mut entry);
                Some(entry)
            });

        nbt.put_int("Length", self.ingredients.len() as i32);
        nbt.insert(
            "Result",
            self.result.as_ref().map(ItemStack::to_nbt).unwrap_or_default(),
        );
        nbt.insert("Ingredients", List::from_compounds(ingredients));
    }

    /// Replaces this recipe with the record in `nbt`.
    ///
    /// Best effort: positions outside the grid and stacks that do not decode
    /// are skipped. Returns `false`, leaving the recipe untouched, if the
    /// record lacks a result or an ingredient list.
    pub fn read_nbt(&mut self, nbt: &Compound) -> bool {
        let (Some(result), Some(ingredients)) =
            (nbt.get_compound("Result"), nbt.get_list("Ingredients"))
        else {
            return false;
        };

        let length = nbt
            .get_int("Length")
            .and_then(|len| usize::try_from(len).ok())
            .filter(|len| (1..=MAX_GRID_SLOTS).contains(len))
            .unwrap_or(self.ingredients.len());
        self.resize_and_clear(length);

        if !ingredients.is_empty() && ingredients.element_type() != TagType::Compound {
            debug!(
                "Ignoring ingredient list of type {}",
                ingredients.element_type().name()
            );
        }

        for entry in ingredients.compounds() {
            let slot = entry
                .get_int("Slot")
                .and_then(|slot| usize::try_from(slot).ok())
                .filter(|slot| *slot < self.ingredients.len());
            match slot {
                Some(slot) => self.ingredients[slot] = ItemStack::from_nbt(entry),
                None => debug!("Skipping ingredient outside the {}-slot grid", length),
            }
        }

        self.result = ItemStack::from_nbt(result);
        true
    }

    /// Encodes the record as an uncompressed tag document.
    pub fn encode(&self) -> NbtResult<Vec<u8>> {
        let mut root = Compound::new();
        self.write_nbt(&mut root);
        let mut out = Vec::new();
        nbt::write_root(&root, &mut out)?;
        Ok(out)
    }

    /// Decodes a record produced by [`encode`](Self::encode).
    ///
    /// Never fails: unreadable input yields an empty recipe of the default size.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        let mut recipe = Self::default();
        match nbt::read_root(&mut &bytes[..]) {
            Ok(root) => {
                recipe.read_nbt(&root);
            }
            Err(e) => warn!("Discarding unreadable recipe record: {e}"),
        }
        recipe
    }
}
