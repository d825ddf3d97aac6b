//! Consent protocol.
//!
//! A proposal is an effect on the consenting actor. It waits for that actor to
//! accept or decline, and lapses at its deadline otherwise. The outcome
//! callbacks live in a [`ProposalHandler`] written at the call site that raised
//! the proposal.

mod engine;
mod error;

use std::fmt;

use arrayvec::ArrayVec;

use crate::config::CoreConfig;
use crate::effect::{EffectContext, EffectId, EffectPayload, HandlerError};
use crate::state::{EntityId, Tick};

pub use engine::ProposalEngine;
pub use error::ProposalError;

/// Normalized keyword list of a proposal.
pub type Keywords = ArrayVec<String, { CoreConfig::MAX_PROPOSAL_KEYWORDS }>;

/// Lifecycle of a proposal. Every state but `Pending` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ProposalState {
    Pending,
    Accepted,
    Declined,
    Expired,
    Revoked,
}

/// The consenting actor's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    fn outcome(self) -> ProposalState {
        match self {
            Decision::Accept => ProposalState::Accepted,
            Decision::Decline => ProposalState::Declined,
        }
    }
}

/// What is being proposed, by whom, to whom.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProposalInfo {
    pub proposer: EntityId,
    pub target: EntityId,
    pub description: String,
    pub keywords: Keywords,
}

impl ProposalInfo {
    /// Returns true if each word is a prefix of one of the keywords.
    ///
    /// Words must already be lowercase.
    pub fn matches_words(&self, words: &[String]) -> bool {
        words
            .iter()
            .all(|word| self.keywords.iter().any(|k| k.starts_with(word.as_str())))
    }

    /// Returns true if either keyword set is covered by the other.
    ///
    /// A set is covered when each of its keywords is a prefix of some keyword
    /// of the other set. Every selector matching a covered set then matches
    /// the covering one too, so the covered proposal could never be picked.
    pub fn overlaps(&self, keywords: &[String]) -> bool {
        fn covered(short: &[String], long: &[String]) -> bool {
            short
                .iter()
                .all(|s| long.iter().any(|l| l.starts_with(s.as_str())))
        }
        covered(&self.keywords, keywords) || covered(keywords, &self.keywords)
    }
}

/// Outcome callbacks of a proposal.
///
/// Each method consumes the handler, so at most one of them can ever run.
pub trait ProposalHandler: Send {
    fn on_accept(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        message: Option<&str>,
    ) -> Result<(), HandlerError>;

    fn on_decline(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        message: Option<&str>,
    ) -> Result<(), HandlerError>;

    fn on_expire(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
    ) -> Result<(), HandlerError>;

    /// The proposer withdrew, or one of the parties was destroyed.
    fn on_revoke(
        self: Box<Self>,
        _ctx: &mut EffectContext<'_>,
        _proposal: &ProposalInfo,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Effect payload of a pending proposal.
pub struct Proposal {
    pub info: ProposalInfo,
    pub handler: Box<dyn ProposalHandler>,
}

impl fmt::Debug for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proposal")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl From<Proposal> for EffectPayload {
    fn from(proposal: Proposal) -> Self {
        EffectPayload::Proposal(proposal)
    }
}

/// Arguments to [`ProposalEngine::propose`].
#[derive(Clone, Debug)]
pub struct ProposalRequest {
    pub proposer: EntityId,
    pub target: EntityId,
    pub description: String,
    pub keywords: Vec<String>,
    /// Ticks until the proposal lapses; the configured default when `None`.
    pub duration: Option<u64>,
}

impl ProposalRequest {
    pub fn new(proposer: EntityId, target: EntityId, description: impl Into<String>) -> Self {
        Self {
            proposer,
            target,
            description: description.into(),
            keywords: Vec::new(),
            duration: None,
        }
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords.into_iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    pub fn duration(mut self, ticks: u64) -> Self {
        self.duration = Some(ticks);
        self
    }
}

/// A pending proposal as shown to the consenting actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProposalSummary {
    pub effect: EffectId,
    pub info: ProposalInfo,
    pub expires_at: Option<Tick>,
}

impl fmt::Display for ProposalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} [{}]",
            self.info.description,
            self.info.proposer,
            self.info.keywords.join(", ")
        )
    }
}

/// Result of resolving a proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProposalOutcome {
    pub effect: EffectId,
    pub info: ProposalInfo,
    pub state: ProposalState,
    /// Set when the outcome callback itself failed.
    pub handler_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(keywords: &[&str]) -> ProposalInfo {
        ProposalInfo {
            proposer: EntityId(1),
            target: EntityId(2),
            description: "test".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn overlap_is_containment_either_way() {
        let tattoo = info(&["tattoo", "inscribe"]);
        assert!(tattoo.overlaps(&words(&["tattoo"])));
        assert!(tattoo.overlaps(&words(&["tattoo", "inscribe", "arm"])));
        assert!(!tattoo.overlaps(&words(&["tattoo", "pierce"])));
        assert!(!tattoo.overlaps(&words(&["pierce"])));
    }

    #[test]
    fn overlap_follows_prefix_matching() {
        let tattoo = info(&["tattoo"]);
        assert!(tattoo.overlaps(&words(&["tattooing"])));
        assert!(tattoo.overlaps(&words(&["tat"])));
        assert!(tattoo.overlaps(&words(&["tattooing", "back"])));
        assert!(!info(&["tattoo", "arm"]).overlaps(&words(&["tattooing", "back"])));
    }

    #[test]
    fn every_word_must_prefix_a_keyword() {
        let tattoo = info(&["tattoo", "inscribe"]);
        assert!(tattoo.matches_words(&words(&["tat"])));
        assert!(tattoo.matches_words(&words(&["tat", "ins"])));
        assert!(!tattoo.matches_words(&words(&["tat", "pierce"])));
        assert!(tattoo.matches_words(&[]));
    }

    #[test]
    fn decision_parses_case_insensitively() {
        assert_eq!("ACCEPT".parse::<Decision>().ok(), Some(Decision::Accept));
        assert_eq!(Decision::Decline.outcome(), ProposalState::Declined);
    }
}
