//! Async orchestration around the accord core.
//!
//! A single simulation worker owns the [`accord_core::Realm`] and applies
//! commands one at a time; an optional clock task advances time from wall
//! time. Consumers drive the realm and subscribe to events through
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{EffectUpdate, Event, EventBus, NoticeEvent, ProposalEvent, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
