use std::collections::BTreeSet;

use crate::state::{EntityId, StrengthClass};

/// A physical item in the world.
///
/// Tags are free-form lowercase labels ("needle", "ink") that plan templates
/// select on; the taxonomy itself belongs to content, not to the core.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemState {
    pub id: EntityId,
    pub name: String,
    pub tags: BTreeSet<String>,
    /// Number of manipulating limbs needed to hold or wield the item.
    pub hands_required: u8,
    /// Weakest grip able to wield the item.
    pub min_strength: StrengthClass,
    /// Stack size for commodities; 1 for ordinary items.
    pub quantity: u32,
}

impl ItemState {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tags: BTreeSet::new(),
            hands_required: 1,
            min_strength: StrengthClass::Feeble,
            quantity: 1,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_ascii_lowercase());
        self
    }

    pub fn with_hands(mut self, hands: u8) -> Self {
        self.hands_required = hands.max(1);
        self
    }

    pub fn with_min_strength(mut self, strength: StrengthClass) -> Self {
        self.min_strength = strength;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }
}
