//! Body model for actors.
//!
//! A body is a short, bounded list of limbs. Each limb declares what it can do
//! ([`LimbCaps`]) and how strong its grip is ([`StrengthClass`]). Items held in
//! a limb are recorded on the limb itself; an item held in two hands appears on
//! both limbs with the same grip.

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::config::CoreConfig;
use crate::state::EntityId;

/// Index of a limb within its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimbId(pub u8);

bitflags! {
    /// Capabilities a limb offers to the resource planner.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LimbCaps: u8 {
        /// Can pick up and hold an item.
        const MANIPULATE = 1 << 0;
        /// Can grip an item firmly enough to use it as a tool or weapon.
        const WIELD = 1 << 1;
    }
}

/// Grip strength class of a limb, and the minimum class an item demands.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StrengthClass {
    Feeble,
    Weak,
    #[default]
    Average,
    Strong,
    Mighty,
}

/// How an item is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Grip {
    /// Simply carried in hand.
    Held,
    /// Gripped ready for use.
    Wielded,
}

/// What a limb currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    pub item: EntityId,
    pub grip: Grip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limb {
    pub id: LimbId,
    pub name: String,
    pub caps: LimbCaps,
    pub strength: StrengthClass,
    /// False while the limb is bound, broken or otherwise unusable.
    pub functional: bool,
    pub holding: Option<Holding>,
}

impl Limb {
    /// Returns true if the limb can currently take hold of something new.
    pub fn is_free_manipulator(&self) -> bool {
        self.functional && self.holding.is_none() && self.caps.contains(LimbCaps::MANIPULATE)
    }

    /// Returns true if the limb can wield an item requiring `strength`.
    pub fn can_wield(&self, strength: StrengthClass) -> bool {
        self.functional && self.caps.contains(LimbCaps::WIELD) && self.strength >= strength
    }
}

/// Limbs of one actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    limbs: ArrayVec<Limb, { CoreConfig::MAX_LIMBS }>,
}

impl Body {
    /// Creates a body with no limbs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing a body.
    pub fn builder() -> BodyBuilder {
        BodyBuilder::default()
    }

    /// Two average-strength hands, both able to wield.
    pub fn humanoid() -> Self {
        Self::builder()
            .hand("right hand", StrengthClass::Average)
            .hand("left hand", StrengthClass::Average)
            .build()
    }

    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    pub fn limb(&self, id: LimbId) -> Option<&Limb> {
        self.limbs.iter().find(|l| l.id == id)
    }

    pub fn limb_mut(&mut self, id: LimbId) -> Option<&mut Limb> {
        self.limbs.iter_mut().find(|l| l.id == id)
    }

    /// Adds a limb, returning its id, or `None` if the body is full.
    pub fn add_limb(
        &mut self,
        name: impl Into<String>,
        caps: LimbCaps,
        strength: StrengthClass,
    ) -> Option<LimbId> {
        if self.limbs.is_full() {
            return None;
        }
        let id = LimbId(self.limbs.len() as u8);
        self.limbs.push(Limb {
            id,
            name: name.into(),
            caps,
            strength,
            functional: true,
            holding: None,
        });
        Some(id)
    }

    /// Limbs currently holding `item`.
    pub fn limbs_holding(&self, item: EntityId) -> Vec<LimbId> {
        self.limbs
            .iter()
            .filter(|l| l.holding.map(|h| h.item) == Some(item))
            .map(|l| l.id)
            .collect()
    }

    /// Returns true if any limb holds `item`.
    pub fn is_holding(&self, item: EntityId) -> bool {
        self.limbs
            .iter()
            .any(|l| l.holding.map(|h| h.item) == Some(item))
    }

    /// Clears `item` from every limb, returning the limbs and grip it occupied.
    pub fn let_go(&mut self, item: EntityId) -> Option<(Vec<LimbId>, Grip)> {
        let mut limbs = Vec::new();
        let mut grip = None;
        for limb in self.limbs.iter_mut() {
            if let Some(holding) = limb.holding
                && holding.item == item
            {
                limbs.push(limb.id);
                grip = Some(holding.grip);
                limb.holding = None;
            }
        }
        grip.map(|g| (limbs, g))
    }
}

/// Builder for constructing bodies.
#[derive(Default)]
pub struct BodyBuilder {
    body: Body,
}

impl BodyBuilder {
    /// Adds a hand: manipulates and wields.
    pub fn hand(mut self, name: &str, strength: StrengthClass) -> Self {
        self.body
            .add_limb(name, LimbCaps::MANIPULATE | LimbCaps::WIELD, strength);
        self
    }

    /// Adds a limb that can hold but not wield (a tail, a hook, a mouth).
    pub fn grasper(mut self, name: &str, strength: StrengthClass) -> Self {
        self.body.add_limb(name, LimbCaps::MANIPULATE, strength);
        self
    }

    pub fn build(self) -> Body {
        self.body
    }
}
