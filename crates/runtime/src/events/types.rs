//! Event types for different topics.

use accord_core::{
    EffectEvent, EffectId, EntityId, Notice, ProposalState, ProposalSummary, Tick,
};
use serde::{Deserialize, Serialize};

/// Events related to proposals and their resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalEvent {
    /// A proposal now waits on its target.
    Raised(ProposalSummary),

    /// A proposal left the pending set.
    Resolved {
        effect: EffectId,
        proposer: EntityId,
        target: EntityId,
        state: ProposalState,
        clock: Tick,
    },
}

/// Effect lifecycle changes other than proposal resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectUpdate {
    pub event: EffectEvent,
    pub clock: Tick,
}

/// A message written to an actor by a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeEvent {
    pub recipient: EntityId,
    pub text: String,
    pub clock: Tick,
}

impl NoticeEvent {
    pub fn new(notice: Notice, clock: Tick) -> Self {
        Self {
            recipient: notice.recipient,
            text: notice.text,
            clock,
        }
    }
}
