//! Item stacks held by recipe slots.

use scroller_common::nbt::{Compound, Tag};
use scroller_common::ItemId;
use tracing::debug;

/// An item, its stack size and optional extra data (enchantments, damage, ...).
///
/// The extra data is opaque to the store and is carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    /// Item identifier.
    pub id: ItemId,
    /// Stack size.
    pub count: u8,
    /// Extra item data.
    pub tag: Option<Compound>,
}

impl ItemStack {
    /// Creates a stack without extra data.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, count: u8) -> Self {
        Self {
            id: id.into(),
            count,
            tag: None,
        }
    }

    /// Attaches extra data.
    #[must_use]
    pub fn with_tag(mut self, tag: Compound) -> Self {
        self.tag = Some(tag);
        self
    }

    /// A stack with no identifier or a zero count holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() || self.count == 0
    }

    /// Writes `id`, `Count` and `tag` into `nbt`.
    pub fn write_nbt(&self, nbt: &mut Compound) {
        nbt.put_string("id", self.id.as_str());
        nbt.put_byte("Count", self.count as i8);
        if let Some(tag) = &self.tag {
            nbt.insert("tag", tag.clone());
        }
    }

    /// Encodes into a fresh compound.
    #[must_use]
    pub fn to_nbt(&self) -> Compound {
        let mut nbt = Compound::new();
        self.write_nbt(&mut nbt);
        nbt
    }

    /// Decodes a stack, returning `None` for anything that reads as empty.
    ///
    /// Extra data that is not a compound is dropped; the item itself is kept.
    #[must_use]
    pub fn from_nbt(nbt: &Compound) -> Option<Self> {
        let id = nbt.get_string("id").filter(|id| !id.is_empty())?;
        let count = nbt.get_byte("Count")? as u8;
        if count == 0 {
            return None;
        }

        let tag = match nbt.get("tag") {
            Some(Tag::Compound(tag)) => Some(tag.clone()),
            Some(other) => {
                debug!(
                    "Dropping extra data of type {} on item {}",
                    other.id().name(),
                    id
                );
                None
            }
            None => None,
        };

        Some(Self {
            id: ItemId::new(id),
            count,
            tag,
        })
    }
}
