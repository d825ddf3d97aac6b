//! Timed actions in progress.

use std::fmt;

use bitflags::bitflags;

use crate::effect::{EffectContext, HandlerError};
use crate::state::EntityId;

bitflags! {
    /// World events that can cut an action short.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct InterruptFlags: u8 {
        /// A participant walked away.
        const MOVEMENT = 1 << 0;
        /// A participant entered combat.
        const COMBAT = 1 << 1;
        /// A participant changed posture (stood up, fell over).
        const POSITION = 1 << 2;
        /// A participant left the game.
        const DEPARTURE = 1 << 3;
        /// A participant died or was destroyed.
        const DEATH = 1 << 4;
    }
}

/// Why an in-progress action stopped early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterruptReason {
    /// Cancelled explicitly through its handle.
    Cancelled,
    /// A world event matching the action's triggers.
    Interrupted(InterruptFlags),
}

/// Callbacks of a timed action. Exactly one of them fires.
pub trait ProgressHandler: Send {
    /// The action ran its full duration.
    fn on_complete(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
    ) -> Result<(), HandlerError>;

    /// The action was cut short.
    fn on_interrupted(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
        reason: InterruptReason,
    ) -> Result<(), HandlerError>;
}

/// Describes an action in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressInfo {
    pub actor: EntityId,
    pub description: String,
    /// Other entities whose disruption also interrupts the action.
    pub participants: Vec<EntityId>,
    pub interrupt_on: InterruptFlags,
}

impl ProgressInfo {
    pub fn new(actor: EntityId, description: impl Into<String>) -> Self {
        Self {
            actor,
            description: description.into(),
            participants: Vec::new(),
            interrupt_on: InterruptFlags::all(),
        }
    }

    pub fn with_participant(mut self, participant: EntityId) -> Self {
        if !self.participants.contains(&participant) {
            self.participants.push(participant);
        }
        self
    }

    pub fn interrupt_on(mut self, flags: InterruptFlags) -> Self {
        self.interrupt_on = flags;
        self
    }

    /// Returns true if `entity` takes part in the action.
    pub fn involves(&self, entity: EntityId) -> bool {
        self.actor == entity || self.participants.contains(&entity)
    }
}

/// Effect payload for an action that occupies its actor for a while.
pub struct ActionInProgress {
    pub info: ProgressInfo,
    pub handler: Box<dyn ProgressHandler>,
}

impl ActionInProgress {
    pub fn new(info: ProgressInfo, handler: impl ProgressHandler + 'static) -> Self {
        Self {
            info,
            handler: Box::new(handler),
        }
    }
}

impl fmt::Debug for ActionInProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInProgress")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
