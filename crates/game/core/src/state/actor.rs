//! Actor and location state.

use crate::state::{Body, EntityId};

/// An actor: somebody with a body, a bag, and a place to stand.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorState {
    pub id: EntityId,
    pub name: String,
    /// None means the actor is not currently in any location.
    pub location: Option<EntityId>,
    pub body: Body,
    /// Items carried but not in hand.
    pub inventory: Vec<EntityId>,
}

impl ActorState {
    pub fn new(id: EntityId, name: impl Into<String>, body: Body) -> Self {
        Self {
            id,
            name: name.into(),
            location: None,
            body,
            inventory: Vec::new(),
        }
    }

    /// Items currently in any limb, in limb order, without duplicates.
    pub fn held_items(&self) -> Vec<EntityId> {
        let mut items: Vec<EntityId> = Vec::new();
        for limb in self.body.limbs() {
            if let Some(holding) = limb.holding
                && !items.contains(&holding.item)
            {
                items.push(holding.item);
            }
        }
        items
    }
}

/// A place actors stand in and items lie in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationState {
    pub id: EntityId,
    pub name: String,
    pub ground: Vec<EntityId>,
}

impl LocationState {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ground: Vec::new(),
        }
    }
}
