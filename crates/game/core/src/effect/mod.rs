//! Timed effects attached to entities.
//!
//! Every effect belongs to exactly one owner and is one of a few variants
//! ([`EffectPayload`]). Variants declare capability tags ([`EffectCaps`]) so
//! callers can ask "is this actor busy?" without knowing every variant.

mod error;
mod progress;
mod scheduler;

use std::fmt;

use bitflags::bitflags;

use crate::proposal::{Proposal, ProposalState};
use crate::state::{EntityId, Tick, WorldState};

pub use error::{HandlerError, SchedulerError};
pub use progress::{ActionInProgress, InterruptFlags, InterruptReason, ProgressHandler, ProgressInfo};
pub use scheduler::EffectScheduler;

/// Handle to an attached effect. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    Proposal,
    InProgress,
    Marker,
}

bitflags! {
    /// Capability tags declared by effect variants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EffectCaps: u8 {
        /// Awaiting the owner's consent.
        const PROPOSAL = 1 << 0;
        /// The owner is busy and cannot start another action.
        const OCCUPIES_ACTOR = 1 << 1;
        /// World events can cut the effect short.
        const INTERRUPTIBLE = 1 << 2;
        /// Purely descriptive; no callbacks.
        const COSMETIC = 1 << 3;
    }
}

/// A labelled tag with no behaviour, such as "fresh tattoo".
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub label: String,
}

impl Marker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[derive(Debug)]
pub enum EffectPayload {
    Proposal(Proposal),
    InProgress(ActionInProgress),
    Marker(Marker),
}

impl EffectPayload {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectPayload::Proposal(_) => EffectKind::Proposal,
            EffectPayload::InProgress(_) => EffectKind::InProgress,
            EffectPayload::Marker(_) => EffectKind::Marker,
        }
    }

    pub fn caps(&self) -> EffectCaps {
        match self {
            EffectPayload::Proposal(_) => EffectCaps::PROPOSAL,
            EffectPayload::InProgress(_) => EffectCaps::OCCUPIES_ACTOR | EffectCaps::INTERRUPTIBLE,
            EffectPayload::Marker(_) => EffectCaps::COSMETIC,
        }
    }

    /// Short human-readable label.
    pub fn describe(&self) -> &str {
        match self {
            EffectPayload::Proposal(p) => &p.info.description,
            EffectPayload::InProgress(a) => &a.info.description,
            EffectPayload::Marker(m) => &m.label,
        }
    }
}

impl From<Marker> for EffectPayload {
    fn from(marker: Marker) -> Self {
        EffectPayload::Marker(marker)
    }
}

impl From<ActionInProgress> for EffectPayload {
    fn from(action: ActionInProgress) -> Self {
        EffectPayload::InProgress(action)
    }
}

/// An effect as stored by the scheduler.
#[derive(Debug)]
pub struct Effect {
    pub id: EffectId,
    pub owner: EntityId,
    pub attached_at: Tick,
    pub expires_at: Option<Tick>,
    pub payload: EffectPayload,
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        self.payload.kind()
    }

    pub fn caps(&self) -> EffectCaps {
        self.payload.caps()
    }
}

/// Mutable access handed to effect callbacks.
///
/// The effect being fired has already been removed from the scheduler, so a
/// callback may freely attach or cancel other effects.
pub struct EffectContext<'a> {
    pub world: &'a mut WorldState,
    pub scheduler: &'a mut EffectScheduler,
    pub now: Tick,
}

impl EffectContext<'_> {
    pub fn notify(&mut self, recipient: EntityId, text: impl Into<String>) {
        self.world.notify(recipient, text);
    }
}

/// Journal entry describing a change to the set of live effects.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum EffectEvent {
    Attached {
        effect: EffectId,
        owner: EntityId,
        kind: EffectKind,
        expires_at: Option<Tick>,
    },
    Expired {
        effect: EffectId,
        owner: EntityId,
        kind: EffectKind,
    },
    Cancelled {
        effect: EffectId,
        owner: EntityId,
        kind: EffectKind,
    },
    Interrupted {
        effect: EffectId,
        owner: EntityId,
        flags: InterruptFlags,
    },
    Purged {
        effect: EffectId,
        owner: EntityId,
        kind: EffectKind,
    },
    ProposalResolved {
        effect: EffectId,
        proposer: EntityId,
        target: EntityId,
        state: ProposalState,
    },
}

impl EffectEvent {
    pub fn effect(&self) -> EffectId {
        match self {
            EffectEvent::Attached { effect, .. }
            | EffectEvent::Expired { effect, .. }
            | EffectEvent::Cancelled { effect, .. }
            | EffectEvent::Interrupted { effect, .. }
            | EffectEvent::Purged { effect, .. }
            | EffectEvent::ProposalResolved { effect, .. } => *effect,
        }
    }
}
