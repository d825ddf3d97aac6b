//! The world: every actor, item and location, plus the narration outbox.

use std::collections::BTreeMap;

use tracing::warn;

use crate::body::{BodyError, BodyInventory, Consumed, HeldItem, ItemOrigin};
use crate::error::{CoreError, ErrorSeverity};
use crate::plan::ItemSelector;
use crate::state::{
    ActorState, Body, EntityId, Grip, Holding, ItemState, Limb, LimbCaps, LimbId, LocationState,
    Notice,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("entity {0} is not a location")]
    NotALocation(EntityId),

    #[error("actor {actor} has no limb {limb:?}")]
    UnknownLimb { actor: EntityId, limb: LimbId },
}

impl CoreError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            WorldError::UnknownEntity(_) => "WORLD_UNKNOWN_ENTITY",
            WorldError::NotALocation(_) => "WORLD_NOT_A_LOCATION",
            WorldError::UnknownLimb { .. } => "WORLD_UNKNOWN_LIMB",
        }
    }
}

/// Where an item currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Held(EntityId),
    Carried(EntityId),
    Ground(EntityId),
    /// Exists but is nowhere (freshly spawned, or between moves).
    Limbo,
}

/// Aggregate state for every entity.
///
/// # Invariants
///
/// - An item is in at most one place: a set of limbs of one actor, one
///   actor's inventory, or one location's ground.
/// - Entity ids are never reused, even after destruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    actors: BTreeMap<EntityId, ActorState>,
    items: BTreeMap<EntityId, ItemState>,
    locations: BTreeMap<EntityId, LocationState>,
    next_id: u32,
    notices: Vec<Notice>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Spawning and lookup
    // ========================================================================

    pub fn spawn_location(&mut self, name: &str) -> EntityId {
        let id = self.allocate_id();
        self.locations.insert(id, LocationState::new(id, name));
        id
    }

    /// Spawns an actor standing in `location`.
    pub fn spawn_actor(&mut self, name: &str, body: Body, location: Option<EntityId>) -> EntityId {
        let id = self.allocate_id();
        let mut actor = ActorState::new(id, name, body);
        actor.location = location.filter(|loc| self.locations.contains_key(loc));
        self.actors.insert(id, actor);
        id
    }

    /// Spawns an item in limbo; place it with [`WorldState::give`] or [`WorldState::drop_at`].
    pub fn spawn_item(&mut self, build: impl FnOnce(EntityId) -> ItemState) -> EntityId {
        let id = self.allocate_id();
        let mut item = build(id);
        item.id = id;
        self.items.insert(id, item);
        id
    }

    pub fn actor(&self, id: EntityId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    pub fn item_state(&self, id: EntityId) -> Option<&ItemState> {
        self.items.get(&id)
    }

    pub fn location(&self, id: EntityId) -> Option<&LocationState> {
        self.locations.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.actors.contains_key(&id)
            || self.items.contains_key(&id)
            || self.locations.contains_key(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values()
    }

    /// Finds where an item currently is.
    pub fn placement(&self, item: EntityId) -> Option<Placement> {
        if !self.items.contains_key(&item) {
            return None;
        }
        for actor in self.actors.values() {
            if actor.body.is_holding(item) {
                return Some(Placement::Held(actor.id));
            }
            if actor.inventory.contains(&item) {
                return Some(Placement::Carried(actor.id));
            }
        }
        for location in self.locations.values() {
            if location.ground.contains(&item) {
                return Some(Placement::Ground(location.id));
            }
        }
        Some(Placement::Limbo)
    }

    // ========================================================================
    // Moving things around
    // ========================================================================

    /// Puts `item` into `actor`'s inventory, taking it from wherever it was.
    pub fn give(&mut self, actor: EntityId, item: EntityId) -> Result<(), WorldError> {
        if !self.actors.contains_key(&actor) {
            return Err(WorldError::UnknownEntity(actor));
        }
        if !self.items.contains_key(&item) {
            return Err(WorldError::UnknownEntity(item));
        }
        self.detach(item);
        if let Some(a) = self.actors.get_mut(&actor) {
            a.inventory.push(item);
        }
        Ok(())
    }

    /// Puts `item` on the ground of `location`, taking it from wherever it was.
    pub fn drop_at(&mut self, location: EntityId, item: EntityId) -> Result<(), WorldError> {
        if !self.items.contains_key(&item) {
            return Err(WorldError::UnknownEntity(item));
        }
        if !self.locations.contains_key(&location) {
            return Err(WorldError::NotALocation(location));
        }
        self.detach(item);
        if let Some(loc) = self.locations.get_mut(&location) {
            loc.ground.push(item);
        }
        Ok(())
    }

    /// Moves an actor; `None` takes it out of every location.
    pub fn move_actor(&mut self, actor: EntityId, to: Option<EntityId>) -> Result<(), WorldError> {
        if let Some(location) = to
            && !self.locations.contains_key(&location)
        {
            return Err(WorldError::NotALocation(location));
        }
        let a = self
            .actors
            .get_mut(&actor)
            .ok_or(WorldError::UnknownEntity(actor))?;
        a.location = to;
        Ok(())
    }

    /// Marks a limb usable or unusable; an unusable limb drops what it holds.
    pub fn set_limb_functional(
        &mut self,
        actor: EntityId,
        limb: LimbId,
        functional: bool,
    ) -> Result<(), WorldError> {
        let dropped = {
            let a = self
                .actors
                .get_mut(&actor)
                .ok_or(WorldError::UnknownEntity(actor))?;
            let l = a
                .body
                .limb_mut(limb)
                .ok_or(WorldError::UnknownLimb { actor, limb })?;
            l.functional = functional;
            if functional { None } else { l.holding.map(|h| h.item) }
        };
        if let Some(item) = dropped {
            self.detach(item);
            if let Some(a) = self.actors.get_mut(&actor) {
                a.inventory.push(item);
            }
        }
        Ok(())
    }

    /// Removes an entity from the world.
    ///
    /// A destroyed actor's belongings fall to the ground where it stood; a
    /// destroyed location takes its ground items with it.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if let Some(actor) = self.actors.remove(&id) {
            let mut belongings = actor.held_items();
            belongings.extend(actor.inventory.iter().copied());
            match actor.location.and_then(|loc| self.locations.get_mut(&loc)) {
                Some(location) => location.ground.extend(belongings),
                None => {
                    for item in belongings {
                        self.items.remove(&item);
                    }
                }
            }
            return true;
        }
        if self.items.contains_key(&id) {
            self.detach(id);
            self.items.remove(&id);
            return true;
        }
        if let Some(location) = self.locations.remove(&id) {
            for item in location.ground {
                self.items.remove(&item);
            }
            for actor in self.actors.values_mut() {
                if actor.location == Some(id) {
                    actor.location = None;
                }
            }
            return true;
        }
        false
    }

    /// Takes `item` out of whatever limbs, inventory or ground holds it.
    fn detach(&mut self, item: EntityId) {
        for actor in self.actors.values_mut() {
            actor.body.let_go(item);
            actor.inventory.retain(|i| *i != item);
        }
        for location in self.locations.values_mut() {
            location.ground.retain(|i| *i != item);
        }
    }

    /// Origin of `item` relative to `actor`, if the actor can reach it.
    fn origin_for(&self, actor: &ActorState, item: EntityId) -> Option<ItemOrigin> {
        let limbs = actor.body.limbs_holding(item);
        if let Some(first) = limbs.first()
            && let Some(holding) = actor.body.limb(*first).and_then(|l| l.holding)
        {
            return Some(ItemOrigin::Held {
                limbs,
                grip: holding.grip,
            });
        }
        if actor.inventory.contains(&item) {
            return Some(ItemOrigin::Carried);
        }
        let location = actor.location?;
        self.locations
            .get(&location)
            .filter(|loc| loc.ground.contains(&item))
            .map(|_| ItemOrigin::Ground(location))
    }

    /// Places a detached item back at `origin`, falling back to the inventory.
    ///
    /// Returns false if the fallback was taken.
    fn place(&mut self, actor: EntityId, item: EntityId, origin: &ItemOrigin) -> bool {
        let placed = match origin {
            ItemOrigin::Carried => false,
            ItemOrigin::Ground(location) => match self.locations.get_mut(location) {
                Some(loc) => {
                    loc.ground.push(item);
                    true
                }
                None => false,
            },
            ItemOrigin::Held { limbs, grip } => match self.actors.get_mut(&actor) {
                Some(a) => {
                    let free = limbs.iter().all(|id| {
                        a.body
                            .limb(*id)
                            .is_some_and(|l| l.holding.is_none() && l.functional)
                    });
                    if free {
                        for id in limbs {
                            if let Some(limb) = a.body.limb_mut(*id) {
                                limb.holding = Some(Holding { item, grip: *grip });
                            }
                        }
                    }
                    free
                }
                None => false,
            },
        };
        if !placed {
            if !matches!(origin, ItemOrigin::Carried) {
                warn!(%actor, %item, ?origin, "origin unavailable, item returned to inventory");
            }
            if let Some(a) = self.actors.get_mut(&actor) {
                a.inventory.push(item);
            }
        }
        placed || matches!(origin, ItemOrigin::Carried)
    }

    // ========================================================================
    // Narration outbox
    // ========================================================================

    pub fn notify(&mut self, recipient: EntityId, text: impl Into<String>) {
        self.notices.push(Notice::new(recipient, text));
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl BodyInventory for WorldState {
    fn limbs(&self, actor: EntityId) -> Vec<Limb> {
        self.actors
            .get(&actor)
            .map(|a| a.body.limbs().to_vec())
            .unwrap_or_default()
    }

    fn held_items(&self, actor: EntityId) -> Vec<HeldItem> {
        let Some(a) = self.actors.get(&actor) else {
            return Vec::new();
        };
        a.held_items()
            .into_iter()
            .filter_map(|item| match self.origin_for(a, item) {
                Some(ItemOrigin::Held { limbs, grip }) => Some(HeldItem { item, limbs, grip }),
                _ => None,
            })
            .collect()
    }

    fn reachable_items(&self, actor: EntityId, selector: &ItemSelector) -> Vec<EntityId> {
        let Some(a) = self.actors.get(&actor) else {
            return Vec::new();
        };
        let ground = a
            .location
            .and_then(|loc| self.locations.get(&loc))
            .map(|loc| loc.ground.as_slice())
            .unwrap_or_default();
        a.inventory
            .iter()
            .chain(ground.iter())
            .copied()
            .filter(|id| self.items.get(id).is_some_and(|item| selector.matches(item)))
            .collect()
    }

    fn item(&self, item: EntityId) -> Option<&ItemState> {
        self.items.get(&item)
    }

    fn acquire(
        &mut self,
        actor: EntityId,
        item: EntityId,
        limbs: &[LimbId],
        grip: Grip,
    ) -> Result<ItemOrigin, BodyError> {
        let a = self
            .actors
            .get(&actor)
            .ok_or(BodyError::ActorNotFound(actor))?;
        if !self.items.contains_key(&item) {
            return Err(BodyError::ItemNotFound(item));
        }
        let origin = self
            .origin_for(a, item)
            .ok_or(BodyError::NotReachable { actor, item })?;
        for id in limbs {
            let usable = a.body.limb(*id).is_some_and(|l| {
                l.functional
                    && l.caps.contains(LimbCaps::MANIPULATE)
                    && l.holding.is_none_or(|h| h.item == item)
            });
            if !usable {
                return Err(BodyError::LimbUnavailable { actor, limb: *id });
            }
        }

        self.detach(item);
        if let Some(a) = self.actors.get_mut(&actor) {
            for id in limbs {
                if let Some(limb) = a.body.limb_mut(*id) {
                    limb.holding = Some(Holding { item, grip });
                }
            }
        }
        Ok(origin)
    }

    fn release(
        &mut self,
        actor: EntityId,
        item: EntityId,
        origin: &ItemOrigin,
    ) -> Result<(), BodyError> {
        if !self.actors.contains_key(&actor) {
            return Err(BodyError::ActorNotFound(actor));
        }
        if !self.items.contains_key(&item) {
            return Err(BodyError::ItemNotFound(item));
        }
        self.detach(item);
        if !self.place(actor, item, origin) {
            return Err(BodyError::OriginUnavailable { item });
        }
        Ok(())
    }

    fn consume(
        &mut self,
        actor: EntityId,
        item: EntityId,
        quantity: u32,
    ) -> Result<Consumed, BodyError> {
        let a = self
            .actors
            .get(&actor)
            .ok_or(BodyError::ActorNotFound(actor))?;
        let origin = self
            .origin_for(a, item)
            .ok_or(BodyError::NotReachable { actor, item })?;
        let state = self
            .items
            .get_mut(&item)
            .ok_or(BodyError::ItemNotFound(item))?;
        if state.quantity < quantity {
            return Err(BodyError::InsufficientQuantity {
                item,
                available: state.quantity,
                requested: quantity,
            });
        }

        let before = state.clone();
        state.quantity -= quantity;
        let depleted = state.quantity == 0;
        if depleted {
            self.detach(item);
            self.items.remove(&item);
        }
        Ok(Consumed {
            before,
            quantity,
            origin,
            depleted,
        })
    }

    fn restore_consumed(&mut self, actor: EntityId, consumed: &Consumed) -> Result<(), BodyError> {
        let item = consumed.before.id;
        if consumed.depleted {
            self.items.insert(item, consumed.before.clone());
            if !self.place(actor, item, &consumed.origin) {
                return Err(BodyError::OriginUnavailable { item });
            }
            return Ok(());
        }
        let state = self
            .items
            .get_mut(&item)
            .ok_or(BodyError::ItemNotFound(item))?;
        state.quantity += consumed.quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WorldState, EntityId, EntityId, EntityId) {
        let mut world = WorldState::new();
        let room = world.spawn_location("parlour");
        let artist = world.spawn_actor("artist", Body::humanoid(), Some(room));
        let needle = world.spawn_item(|id| ItemState::new(id, "needle"));
        world.drop_at(room, needle).unwrap();
        (world, room, artist, needle)
    }

    #[test]
    fn unknown_limb_names_the_limb() {
        let (mut world, _, artist, _) = setup();
        let err = world
            .set_limb_functional(artist, LimbId(99), false)
            .unwrap_err();
        assert_eq!(
            err,
            WorldError::UnknownLimb {
                actor: artist,
                limb: LimbId(99)
            }
        );
        assert_eq!(err.error_code(), "WORLD_UNKNOWN_LIMB");
    }

    #[test]
    fn release_to_vanished_origin_falls_back_to_inventory() {
        let (mut world, room, artist, needle) = setup();
        let origin = world
            .acquire(artist, needle, &[LimbId(0)], Grip::Held)
            .unwrap();
        assert_eq!(origin, ItemOrigin::Ground(room));

        world.destroy(room);
        let err = world.release(artist, needle, &origin).unwrap_err();
        assert_eq!(err, BodyError::OriginUnavailable { item: needle });
        assert_eq!(world.placement(needle), Some(Placement::Carried(artist)));
    }

    #[test]
    fn release_to_origin_succeeds() {
        let (mut world, room, artist, needle) = setup();
        let origin = world
            .acquire(artist, needle, &[LimbId(0)], Grip::Held)
            .unwrap();
        world.release(artist, needle, &origin).unwrap();
        assert_eq!(world.placement(needle), Some(Placement::Ground(room)));
    }
}
