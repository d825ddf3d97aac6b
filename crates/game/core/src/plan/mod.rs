//! Resource plan engine.
//!
//! A [`PlanTemplate`] lists phases of resource requirements. A
//! [`PlanInstance`] binds a template to one actor and walks it through
//! check, execute and finalize against a [`crate::body::BodyInventory`].

mod error;
mod feasibility;
mod instance;
mod planner;
mod template;

pub use error::PlanError;
pub use feasibility::Feasibility;
pub use instance::{PlanGuard, PlanInstance, PlanState, Resolution, RetainedResources};
pub use template::{
    ItemPredicate, ItemSelector, PlanAction, PlanActionKind, PlanPhase, PlanTemplate,
    PlanTemplateBuilder,
};
