use crate::body::BodyError;
use crate::error::{CoreError, ErrorSeverity};
use crate::plan::PlanError;
use crate::state::{EntityId, WorldError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("entity {0} was destroyed and cannot own effects")]
    OwnerRetired(EntityId),

    #[error("entity {0} does not exist")]
    UnknownOwner(EntityId),
}

impl CoreError for SchedulerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            SchedulerError::OwnerRetired(_) => "SCHEDULER_OWNER_RETIRED",
            SchedulerError::UnknownOwner(_) => "SCHEDULER_UNKNOWN_OWNER",
        }
    }
}

/// Failure reported by an effect callback.
///
/// The scheduler logs it and moves on; it never propagates to other effects.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<PlanError> for HandlerError {
    fn from(e: PlanError) -> Self {
        Self(e.to_string())
    }
}

impl From<BodyError> for HandlerError {
    fn from(e: BodyError) -> Self {
        Self(e.to_string())
    }
}

impl From<SchedulerError> for HandlerError {
    fn from(e: SchedulerError) -> Self {
        Self(e.to_string())
    }
}

impl From<WorldError> for HandlerError {
    fn from(e: WorldError) -> Self {
        Self(e.to_string())
    }
}

impl CoreError for HandlerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        "EFFECT_HANDLER_FAILED"
    }
}
