use crate::effect::SchedulerError;
use crate::error::{CoreError, ErrorSeverity};
use crate::proposal::ProposalSummary;
use crate::state::EntityId;

fn describe(candidates: &[ProposalSummary]) -> String {
    candidates
        .iter()
        .map(|c| c.info.description.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    #[error("more than one proposal matches: {}", describe(.candidates))]
    AmbiguousProposal { candidates: Vec<ProposalSummary> },

    #[error("no matching proposal for {target}")]
    NoProposal { target: EntityId },

    #[error("{target} already has {limit} pending proposals")]
    TooManyProposals { target: EntityId, limit: usize },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl ProposalError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidProposal {
            reason: reason.into(),
        }
    }
}

impl CoreError for ProposalError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ProposalError::InvalidProposal { .. } | ProposalError::AmbiguousProposal { .. } => {
                ErrorSeverity::Validation
            }
            ProposalError::NoProposal { .. } | ProposalError::TooManyProposals { .. } => {
                ErrorSeverity::Recoverable
            }
            ProposalError::Scheduler(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProposalError::InvalidProposal { .. } => "PROPOSAL_INVALID",
            ProposalError::AmbiguousProposal { .. } => "PROPOSAL_AMBIGUOUS",
            ProposalError::NoProposal { .. } => "PROPOSAL_NOT_FOUND",
            ProposalError::TooManyProposals { .. } => "PROPOSAL_TOO_MANY",
            ProposalError::Scheduler(_) => "PROPOSAL_SCHEDULER",
        }
    }
}
