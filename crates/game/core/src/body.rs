//! Body/inventory collaborator consumed by the resource plan engine.
//!
//! The plan engine never caches what an actor holds or carries: every
//! feasibility check and every execution re-queries this trait, so the answers
//! always reflect the world at the moment of the call.

use crate::error::{CoreError, ErrorSeverity};
use crate::plan::ItemSelector;
use crate::state::{EntityId, Grip, ItemState, Limb, LimbCaps, LimbId, StrengthClass};

/// An item in hand together with the limbs holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeldItem {
    pub item: EntityId,
    pub limbs: Vec<LimbId>,
    pub grip: Grip,
}

/// Where an item was before an acquisition moved it, so it can be put back.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemOrigin {
    /// Carried in the actor's inventory.
    Carried,
    /// Lying on the ground of a location.
    Ground(EntityId),
    /// Already in the actor's hands, possibly with another grip.
    Held { limbs: Vec<LimbId>, grip: Grip },
}

/// Record of a consumption, sufficient to undo it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consumed {
    /// Item as it was before consumption.
    pub before: ItemState,
    pub quantity: u32,
    pub origin: ItemOrigin,
    /// True if the stack ran out and the item left the world.
    pub depleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("actor {0} not found")]
    ActorNotFound(EntityId),

    #[error("item {0} not found")]
    ItemNotFound(EntityId),

    #[error("limb {limb:?} of actor {actor} cannot take hold of anything")]
    LimbUnavailable { actor: EntityId, limb: LimbId },

    #[error("item {item} is not within reach of actor {actor}")]
    NotReachable { actor: EntityId, item: EntityId },

    #[error("item {item} has {available} left, {requested} requested")]
    InsufficientQuantity {
        item: EntityId,
        available: u32,
        requested: u32,
    },

    #[error("item {item} cannot be returned to where it came from")]
    OriginUnavailable { item: EntityId },
}

impl CoreError for BodyError {
    fn severity(&self) -> ErrorSeverity {
        use BodyError::*;
        match self {
            ActorNotFound(_) | ItemNotFound(_) => ErrorSeverity::Validation,
            LimbUnavailable { .. } | NotReachable { .. } | InsufficientQuantity { .. } => {
                ErrorSeverity::Recoverable
            }
            OriginUnavailable { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use BodyError::*;
        match self {
            ActorNotFound(_) => "BODY_ACTOR_NOT_FOUND",
            ItemNotFound(_) => "BODY_ITEM_NOT_FOUND",
            LimbUnavailable { .. } => "BODY_LIMB_UNAVAILABLE",
            NotReachable { .. } => "BODY_NOT_REACHABLE",
            InsufficientQuantity { .. } => "BODY_INSUFFICIENT_QUANTITY",
            OriginUnavailable { .. } => "BODY_ORIGIN_UNAVAILABLE",
        }
    }
}

/// Authoritative view of actors' bodies and belongings.
///
/// Query methods never fail: an unknown actor simply has no limbs and no
/// items, which the planner reports as an infeasible plan.
pub trait BodyInventory {
    /// All limbs of `actor`, in body order.
    fn limbs(&self, actor: EntityId) -> Vec<Limb>;

    /// Items in `actor`'s limbs.
    fn held_items(&self, actor: EntityId) -> Vec<HeldItem>;

    /// Items within reach of `actor` that match `selector` and are not in hand.
    ///
    /// Carried items come first, then items on the ground where the actor stands.
    fn reachable_items(&self, actor: EntityId, selector: &ItemSelector) -> Vec<EntityId>;

    fn item(&self, item: EntityId) -> Option<&ItemState>;

    /// Puts `item` into `limbs` with `grip`, returning where it came from.
    fn acquire(
        &mut self,
        actor: EntityId,
        item: EntityId,
        limbs: &[LimbId],
        grip: Grip,
    ) -> Result<ItemOrigin, BodyError>;

    /// Returns `item` to `origin`, undoing an [`BodyInventory::acquire`].
    fn release(
        &mut self,
        actor: EntityId,
        item: EntityId,
        origin: &ItemOrigin,
    ) -> Result<(), BodyError>;

    /// Draws `quantity` from a stack within reach.
    fn consume(
        &mut self,
        actor: EntityId,
        item: EntityId,
        quantity: u32,
    ) -> Result<Consumed, BodyError>;

    /// Undoes a [`BodyInventory::consume`].
    fn restore_consumed(&mut self, actor: EntityId, consumed: &Consumed) -> Result<(), BodyError>;

    /// Functional manipulating limbs holding nothing.
    fn free_manipulators(&self, actor: EntityId) -> Vec<LimbId> {
        self.limbs(actor)
            .iter()
            .filter(|l| l.is_free_manipulator())
            .map(|l| l.id)
            .collect()
    }

    /// Functional wield-capable limbs and their strength, held or not.
    fn wielders(&self, actor: EntityId) -> Vec<(LimbId, StrengthClass)> {
        self.limbs(actor)
            .iter()
            .filter(|l| l.functional && l.caps.contains(LimbCaps::WIELD))
            .map(|l| (l.id, l.strength))
            .collect()
    }
}
