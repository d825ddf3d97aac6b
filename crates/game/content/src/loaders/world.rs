//! Starting world loader.
//!
//! A world file names its locations, actors and items; the loader spawns them
//! into a fresh [`WorldState`] and hands back the name → id table so scripts
//! can refer to entities by name.

use std::collections::BTreeMap;
use std::path::Path;

use accord_core::{
    Body, BodyInventory, EntityId, Grip, ItemState, LimbCaps, StrengthClass, WorldState,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimbKind {
    /// Holds and wields.
    Hand,
    /// Holds only.
    Grasper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimbSpec {
    pub name: String,
    pub kind: LimbKind,
    #[serde(default)]
    pub strength: StrengthClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Two average hands when omitted.
    #[serde(default)]
    pub limbs: Option<Vec<LimbSpec>>,
}

/// Where an item starts out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemPlacement {
    Carried(String),
    Held(String),
    Ground(String),
}

fn default_hands() -> u8 {
    1
}

fn default_quantity() -> u32 {
    1
}

fn default_min_strength() -> StrengthClass {
    StrengthClass::Feeble
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_hands")]
    pub hands: u8,
    #[serde(default = "default_min_strength")]
    pub min_strength: StrengthClass,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub place: ItemPlacement,
}

/// World file structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSpec {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

/// A spawned world plus the ids of its named entities.
#[derive(Debug, Clone)]
pub struct LoadedWorld {
    pub world: WorldState,
    pub names: BTreeMap<String, EntityId>,
}

impl LoadedWorld {
    pub fn id(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn require(&self, name: &str) -> LoadResult<EntityId> {
        self.id(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown entity '{}' in world", name))
    }
}

/// Loader for starting worlds from RON files.
pub struct WorldLoader;

impl WorldLoader {
    pub fn load(path: &Path) -> LoadResult<LoadedWorld> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<LoadedWorld> {
        let spec: WorldSpec = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse world RON: {}", e))?;
        Self::build(&spec)
    }

    /// Spawns every entity of `spec` into a new world.
    pub fn build(spec: &WorldSpec) -> LoadResult<LoadedWorld> {
        let mut world = WorldState::new();
        let mut names: BTreeMap<String, EntityId> = BTreeMap::new();

        for location in &spec.locations {
            let id = world.spawn_location(location);
            claim(&mut names, location, id)?;
        }

        for actor in &spec.actors {
            let location = match &actor.location {
                Some(name) => Some(lookup(&names, name)?),
                None => None,
            };
            let body = match &actor.limbs {
                Some(limbs) => build_body(&actor.name, limbs)?,
                None => Body::humanoid(),
            };
            let id = world.spawn_actor(&actor.name, body, location);
            claim(&mut names, &actor.name, id)?;
        }

        for item in &spec.items {
            let state = item
                .tags
                .iter()
                .fold(ItemState::new(EntityId(0), &item.name), |state, tag| {
                    state.with_tag(tag)
                })
                .with_hands(item.hands)
                .with_min_strength(item.min_strength)
                .with_quantity(item.quantity);
            let id = world.spawn_item(|_| state);
            claim(&mut names, &item.name, id)?;
            place(&mut world, &names, &item.name, id, &item.place)?;
        }

        debug!(
            locations = spec.locations.len(),
            actors = spec.actors.len(),
            items = spec.items.len(),
            "world loaded"
        );
        Ok(LoadedWorld { world, names })
    }
}

fn claim(names: &mut BTreeMap<String, EntityId>, name: &str, id: EntityId) -> LoadResult<()> {
    if names.insert(name.to_string(), id).is_some() {
        anyhow::bail!("Duplicate entity name '{}'", name);
    }
    Ok(())
}

fn lookup(names: &BTreeMap<String, EntityId>, name: &str) -> LoadResult<EntityId> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Reference to unknown entity '{}'", name))
}

fn build_body(actor: &str, limbs: &[LimbSpec]) -> LoadResult<Body> {
    let mut body = Body::empty();
    for limb in limbs {
        let caps = match limb.kind {
            LimbKind::Hand => LimbCaps::MANIPULATE | LimbCaps::WIELD,
            LimbKind::Grasper => LimbCaps::MANIPULATE,
        };
        if body.add_limb(&limb.name, caps, limb.strength).is_none() {
            anyhow::bail!("Actor '{}' has too many limbs", actor);
        }
    }
    Ok(body)
}

fn place(
    world: &mut WorldState,
    names: &BTreeMap<String, EntityId>,
    item_name: &str,
    item: EntityId,
    placement: &ItemPlacement,
) -> LoadResult<()> {
    match placement {
        ItemPlacement::Carried(owner) => {
            let owner = lookup(names, owner)?;
            world
                .give(owner, item)
                .map_err(|e| anyhow::anyhow!("Cannot place '{}': {}", item_name, e))
        }
        ItemPlacement::Ground(location) => {
            let location = lookup(names, location)?;
            world
                .drop_at(location, item)
                .map_err(|e| anyhow::anyhow!("Cannot place '{}': {}", item_name, e))
        }
        ItemPlacement::Held(owner) => {
            let owner = lookup(names, owner)?;
            world
                .give(owner, item)
                .map_err(|e| anyhow::anyhow!("Cannot place '{}': {}", item_name, e))?;
            let hands = world.item(item).map_or(1, |i| usize::from(i.hands_required));
            let free = world.free_manipulators(owner);
            if free.len() < hands {
                anyhow::bail!("Not enough free hands to hold '{}'", item_name);
            }
            world
                .acquire(owner, item, &free[..hands], Grip::Held)
                .map_err(|e| anyhow::anyhow!("Cannot place '{}': {}", item_name, e))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::Placement;

    const PARLOUR: &str = r#"
(
    locations: ["parlour"],
    actors: [
        (name: "Mara", location: Some("parlour")),
        (
            name: "Tok",
            location: Some("parlour"),
            limbs: Some([
                (name: "claw", kind: Hand, strength: Strong),
                (name: "tail", kind: Grasper),
            ]),
        ),
    ],
    items: [
        (name: "needle", tags: ["needle"], place: Carried("Mara")),
        (name: "lamp", tags: ["lamp"], place: Held("Tok")),
        (name: "ink", tags: ["ink"], quantity: 3, place: Ground("parlour")),
    ],
)
"#;

    #[test]
    fn spawns_and_places_everything() {
        let loaded = WorldLoader::parse(PARLOUR).unwrap();
        let world = &loaded.world;
        let mara = loaded.require("Mara").unwrap();
        let tok = loaded.require("Tok").unwrap();
        let parlour = loaded.require("parlour").unwrap();

        assert_eq!(
            world.placement(loaded.require("needle").unwrap()),
            Some(Placement::Carried(mara))
        );
        assert_eq!(
            world.placement(loaded.require("lamp").unwrap()),
            Some(Placement::Held(tok))
        );
        let ink = loaded.require("ink").unwrap();
        assert_eq!(world.placement(ink), Some(Placement::Ground(parlour)));
        assert_eq!(world.item_state(ink).map(|i| i.quantity), Some(3));

        let tok_body = &world.actor(tok).unwrap().body;
        assert_eq!(tok_body.limbs().len(), 2);
        assert_eq!(tok_body.limbs()[0].strength, StrengthClass::Strong);
        assert!(!tok_body.limbs()[1].caps.contains(LimbCaps::WIELD));
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let spec = r#"(items: [(name: "ghost", place: Carried("nobody"))])"#;
        let err = WorldLoader::parse(spec).unwrap_err();
        assert!(err.to_string().contains("nobody"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let spec = r#"(locations: ["hall", "hall"])"#;
        assert!(WorldLoader::parse(spec).is_err());
    }
}
