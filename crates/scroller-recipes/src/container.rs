//! Container snapshot contract.
//!
//! The store never inspects a live container itself. The host hands it a
//! [`ContainerSnapshot`] that answers two questions: which slots form the
//! crafting grid behind an output slot, and what each slot currently holds.

use std::ops::Range;

use crate::item_stack::ItemStack;

/// Index of a slot in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef(pub usize);

impl SlotRef {
    /// Returns the raw slot number.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A contiguous run of container slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    first: usize,
    count: usize,
}

impl SlotRange {
    /// Creates a range of `count` slots starting at `first`.
    #[must_use]
    pub const fn new(first: usize, count: usize) -> Self {
        Self { first, count }
    }

    /// First slot number.
    #[must_use]
    pub const fn first(&self) -> usize {
        self.first
    }

    /// Number of slots.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Whether `slot` falls inside the range.
    #[must_use]
    pub const fn contains(&self, slot: usize) -> bool {
        slot >= self.first && slot < self.first.saturating_add(self.count)
    }

    /// Slot numbers in order.
    #[must_use]
    pub fn slots(&self) -> Range<usize> {
        self.first..self.first.saturating_add(self.count)
    }
}

/// Read-only view of a container at the moment a recipe is captured.
pub trait ContainerSnapshot {
    /// The crafting grid that feeds `output`, or `None` if `output` is not a
    /// crafting result slot.
    fn crafting_range(&self, output: SlotRef) -> Option<SlotRange>;

    /// Contents of `slot`, or `None` when it is empty or does not exist.
    fn stack(&self, slot: SlotRef) -> Option<ItemStack>;

    /// Total number of slots in the container.
    fn slot_count(&self) -> usize;
}

/// An owned copy of a container's slots.
///
/// Hosts that prefer to copy state once per interaction can fill one of
/// these instead of implementing [`ContainerSnapshot`] on their own types.
#[derive(Debug, Clone, Default)]
pub struct CapturedContainer {
    slots: Vec<Option<ItemStack>>,
    crafting_areas: Vec<(SlotRef, SlotRange)>,
}

impl CapturedContainer {
    /// Creates a container with `slot_count` empty slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            crafting_areas: Vec::new(),
        }
    }

    /// Registers a crafting grid feeding `output`.
    #[must_use]
    pub fn with_crafting_area(mut self, output: SlotRef, grid: SlotRange) -> Self {
        self.crafting_areas.push((output, grid));
        self
    }

    /// Puts a stack into a slot. Out-of-range slots are ignored.
    pub fn set(&mut self, slot: SlotRef, stack: Option<ItemStack>) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = stack.filter(|s| !s.is_empty());
        }
    }
}

impl ContainerSnapshot for CapturedContainer {
    fn crafting_range(&self, output: SlotRef) -> Option<SlotRange> {
        self.crafting_areas
            .iter()
            .find(|(slot, _)| *slot == output)
            .map(|(_, range)| *range)
    }

    fn stack(&self, slot: SlotRef) -> Option<ItemStack> {
        self.slots.get(slot.index()).cloned().flatten()
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_range() {
        let range = SlotRange::new(1, 9);
        assert_eq!(range.slots(), 1..10);
        assert!(range.contains(1));
        assert!(range.contains(9));
        assert!(!range.contains(0));
        assert!(!range.contains(10));
    }

    #[test]
    fn test_slot_range_at_upper_limit() {
        let range = SlotRange::new(usize::MAX - 1, 9);
        assert!(range.contains(usize::MAX - 1));
        assert!(!range.contains(0));
        assert_eq!(range.slots().len(), 1);
    }

    #[test]
    fn test_captured_container() {
        let mut container = CapturedContainer::new(10)
            .with_crafting_area(SlotRef(0), SlotRange::new(1, 9));
        container.set(SlotRef(3), Some(ItemStack::new("minecraft:stick", 2)));
        container.set(SlotRef(4), Some(ItemStack::new("minecraft:stick", 0)));
        container.set(SlotRef(99), Some(ItemStack::new("minecraft:stick", 1)));

        assert_eq!(container.slot_count(), 10);
        assert_eq!(container.crafting_range(SlotRef(0)), Some(SlotRange::new(1, 9)));
        assert_eq!(container.crafting_range(SlotRef(1)), None);
        assert_eq!(container.stack(SlotRef(3)).map(|s| s.count), Some(2));
        assert!(container.stack(SlotRef(4)).is_none());
        assert!(container.stack(SlotRef(99)).is_none());
    }
}
