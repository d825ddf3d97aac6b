use crate::body::BodyError;
use crate::error::{CoreError, ErrorSeverity};
use crate::plan::Feasibility;
use crate::state::EntityId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("plan '{template}' for actor {actor} executed without a feasible check")]
    NotChecked { template: String, actor: EntityId },

    #[error("plan '{template}' was already executed")]
    AlreadyExecuted { template: String },

    #[error("plan is no longer feasible: {0}")]
    NoLongerFeasible(Feasibility),

    #[error("acquisition failed: {0}")]
    Acquisition(#[from] BodyError),
}

impl PlanError {
    /// Feasibility shortfall carried by this error, if any.
    pub fn feasibility(&self) -> Option<Feasibility> {
        match self {
            PlanError::NoLongerFeasible(f) => Some(*f),
            _ => None,
        }
    }
}

impl CoreError for PlanError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PlanError::NotChecked { .. } | PlanError::AlreadyExecuted { .. } => {
                ErrorSeverity::Internal
            }
            PlanError::NoLongerFeasible(_) => ErrorSeverity::Recoverable,
            PlanError::Acquisition(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlanError::NotChecked { .. } => "PLAN_NOT_CHECKED",
            PlanError::AlreadyExecuted { .. } => "PLAN_ALREADY_EXECUTED",
            PlanError::NoLongerFeasible(_) => "PLAN_NO_LONGER_FEASIBLE",
            PlanError::Acquisition(_) => "PLAN_ACQUISITION_FAILED",
        }
    }
}
