//! World state: actors with bodies, items, locations and the notice outbox.

mod actor;
mod body;
mod common;
mod item;
mod world;

pub use actor::{ActorState, LocationState};
pub use body::{Body, BodyBuilder, Grip, Holding, Limb, LimbCaps, LimbId, StrengthClass};
pub use common::{EntityId, Notice, Tick};
pub use item::ItemState;
pub use world::{Placement, WorldError, WorldState};
