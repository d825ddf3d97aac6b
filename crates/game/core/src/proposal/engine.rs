use tracing::{debug, error, info};

use crate::config::CoreConfig;
use crate::effect::{EffectContext, EffectEvent, EffectId, EffectKind, EffectPayload, EffectScheduler};
use crate::proposal::{
    Decision, Keywords, Proposal, ProposalError, ProposalHandler, ProposalInfo, ProposalOutcome,
    ProposalRequest, ProposalSummary,
};
use crate::state::{EntityId, WorldState};

/// Raises, resolves and revokes proposals.
///
/// The engine keeps no state of its own: pending proposals are effects in the
/// scheduler it is handed, owned by the consenting actor.
#[derive(Clone, Debug, Default)]
pub struct ProposalEngine {
    config: CoreConfig,
}

impl ProposalEngine {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Attaches a proposal to the consenting actor.
    ///
    /// # Errors
    ///
    /// - [`ProposalError::InvalidProposal`] if the keywords fully overlap those
    ///   of a proposal already pending on the target, or the request is
    ///   malformed
    /// - [`ProposalError::TooManyProposals`] if the target's queue is full
    pub fn propose(
        &self,
        scheduler: &mut EffectScheduler,
        request: ProposalRequest,
        handler: Box<dyn ProposalHandler>,
    ) -> Result<EffectId, ProposalError> {
        let ProposalRequest {
            proposer,
            target,
            description,
            keywords,
            duration,
        } = request;

        if description.trim().is_empty() {
            return Err(ProposalError::invalid("a proposal needs a description"));
        }
        if proposer == target {
            return Err(ProposalError::invalid("an actor cannot propose to itself"));
        }
        let keywords = normalize(&keywords)?;

        let pending: Vec<&ProposalInfo> = scheduler
            .query(target, EffectKind::Proposal)
            .filter_map(|e| match &e.payload {
                EffectPayload::Proposal(p) => Some(&p.info),
                _ => None,
            })
            .collect();
        let limit = self.config.max_proposals_per_target;
        if pending.len() >= limit {
            return Err(ProposalError::TooManyProposals { target, limit });
        }
        if let Some(existing) = pending.iter().find(|p| p.overlaps(&keywords)) {
            return Err(ProposalError::invalid(format!(
                "keywords overlap the pending proposal '{}'",
                existing.description
            )));
        }

        let duration = duration.unwrap_or(self.config.default_proposal_ticks);
        let info = ProposalInfo {
            proposer,
            target,
            description,
            keywords,
        };
        let description = info.description.clone();
        let id = scheduler.attach(target, Proposal { info, handler }, Some(duration))?;
        info!(%id, %proposer, %target, %description, duration, "proposal raised");
        Ok(id)
    }

    /// Answers a proposal pending on `target`.
    ///
    /// An empty selector picks the only pending proposal. Otherwise every
    /// whitespace-separated word of the selector must be a case-insensitive
    /// prefix of one of the proposal's keywords.
    ///
    /// The proposal is removed before its callback runs, so it can neither be
    /// resolved again nor expire afterwards. A failing callback is logged and
    /// reported in the outcome.
    pub fn resolve(
        &self,
        ctx: &mut EffectContext<'_>,
        target: EntityId,
        selector: &str,
        decision: Decision,
        message: Option<&str>,
    ) -> Result<ProposalOutcome, ProposalError> {
        let words: Vec<String> = selector.split_whitespace().map(str::to_lowercase).collect();
        let candidates = self.pending(ctx.scheduler, target);

        let mut matched: Vec<ProposalSummary> = if words.is_empty() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|c| c.info.matches_words(&words))
                .collect()
        };
        match matched.len() {
            0 => return Err(ProposalError::NoProposal { target }),
            1 => {}
            _ => {
                debug!(%target, selector, count = matched.len(), "ambiguous proposal selector");
                return Err(ProposalError::AmbiguousProposal {
                    candidates: matched,
                });
            }
        }

        let chosen = matched.remove(0);
        let Some(EffectPayload::Proposal(Proposal { info, handler })) =
            ctx.scheduler.take(chosen.effect).map(|e| e.payload)
        else {
            return Err(ProposalError::NoProposal { target });
        };

        let state = decision.outcome();
        ctx.scheduler.record(EffectEvent::ProposalResolved {
            effect: chosen.effect,
            proposer: info.proposer,
            target,
            state,
        });
        info!(
            id = %chosen.effect,
            proposer = %info.proposer,
            %target,
            %state,
            description = %info.description,
            "proposal resolved"
        );

        let result = match decision {
            Decision::Accept => handler.on_accept(ctx, &info, message),
            Decision::Decline => handler.on_decline(ctx, &info, message),
        };
        let handler_error = result.err().map(|e| {
            error!(id = %chosen.effect, %state, error = %e, "proposal callback failed");
            e.to_string()
        });

        Ok(ProposalOutcome {
            effect: chosen.effect,
            info,
            state,
            handler_error,
        })
    }

    /// Withdraws a proposal, firing only its revoke hook.
    ///
    /// Returns false if `id` is not a live proposal.
    pub fn revoke(&self, scheduler: &mut EffectScheduler, id: EffectId, world: &mut WorldState) -> bool {
        let is_proposal = scheduler
            .get(id)
            .is_some_and(|e| e.kind() == EffectKind::Proposal);
        is_proposal && scheduler.cancel(id, world)
    }

    /// Withdraws every proposal raised by `proposer`.
    pub fn revoke_by_proposer(
        &self,
        scheduler: &mut EffectScheduler,
        proposer: EntityId,
        world: &mut WorldState,
    ) -> usize {
        let ids: Vec<EffectId> = self
            .outgoing(scheduler, proposer)
            .into_iter()
            .map(|s| s.effect)
            .collect();
        ids.into_iter()
            .filter(|id| scheduler.cancel(*id, world))
            .count()
    }

    /// Proposals awaiting `target`'s answer, oldest first.
    pub fn pending(&self, scheduler: &EffectScheduler, target: EntityId) -> Vec<ProposalSummary> {
        scheduler
            .query(target, EffectKind::Proposal)
            .filter_map(|e| match &e.payload {
                EffectPayload::Proposal(p) => Some(ProposalSummary {
                    effect: e.id,
                    info: p.info.clone(),
                    expires_at: e.expires_at,
                }),
                _ => None,
            })
            .collect()
    }

    /// Proposals raised by `proposer` that are still pending.
    pub fn outgoing(&self, scheduler: &EffectScheduler, proposer: EntityId) -> Vec<ProposalSummary> {
        scheduler
            .iter()
            .filter_map(|e| match &e.payload {
                EffectPayload::Proposal(p) if p.info.proposer == proposer => Some(ProposalSummary {
                    effect: e.id,
                    info: p.info.clone(),
                    expires_at: e.expires_at,
                }),
                _ => None,
            })
            .collect()
    }
}

/// Lowercases, splits and dedupes keywords.
fn normalize(raw: &[String]) -> Result<Keywords, ProposalError> {
    let mut keywords = Keywords::new();
    for word in raw.iter().flat_map(|k| k.split_whitespace()) {
        let word = word.to_lowercase();
        if keywords.contains(&word) {
            continue;
        }
        keywords.try_push(word).map_err(|_| {
            ProposalError::invalid(format!(
                "at most {} keywords allowed",
                CoreConfig::MAX_PROPOSAL_KEYWORDS
            ))
        })?;
    }
    if keywords.is_empty() {
        return Err(ProposalError::invalid("at least one keyword required"));
    }
    Ok(keywords)
}
