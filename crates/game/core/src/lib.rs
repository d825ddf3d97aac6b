//! Deterministic core of the consensual resourced action pipeline.
//!
//! An actor proposes an action to another participant, who must consent
//! before it happens. The action needs limbs and the tools held in them, and
//! once started it runs for a while during which world events can cut it
//! short. Three components cover this:
//!
//! - [`effect`]: time-bounded effects on entities and their expiry
//! - [`proposal`]: consent as an effect on the consenting actor
//! - [`plan`]: resource feasibility, acquisition and release
//!
//! [`engine::Realm`] wires them to a [`state::WorldState`].
pub mod body;
pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod plan;
pub mod proposal;
pub mod state;

pub use body::{BodyError, BodyInventory, Consumed, HeldItem, ItemOrigin};
pub use config::CoreConfig;
pub use effect::{
    ActionInProgress, Effect, EffectCaps, EffectContext, EffectEvent, EffectId, EffectKind,
    EffectPayload, EffectScheduler, HandlerError, InterruptFlags, InterruptReason, Marker,
    ProgressHandler, ProgressInfo, SchedulerError,
};
pub use engine::Realm;
pub use error::{CoreError, ErrorSeverity};
pub use plan::{
    Feasibility, ItemPredicate, ItemSelector, PlanAction, PlanActionKind, PlanError, PlanGuard,
    PlanInstance, PlanPhase, PlanState, PlanTemplate, Resolution, RetainedResources,
};
pub use proposal::{
    Decision, Proposal, ProposalEngine, ProposalError, ProposalHandler, ProposalInfo,
    ProposalOutcome, ProposalRequest, ProposalState, ProposalSummary,
};
pub use state::{
    ActorState, Body, BodyBuilder, EntityId, Grip, ItemState, Limb, LimbCaps, LimbId,
    LocationState, Notice, Placement, StrengthClass, Tick, WorldError, WorldState,
};
