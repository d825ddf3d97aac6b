//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and from the core so clients can
//! bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use accord_core::{CoreError, ErrorSeverity, ProposalError, SchedulerError, WorldError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("runtime worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl RuntimeError {
    /// Severity of the underlying failure; plumbing failures are fatal.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Proposal(e) => e.severity(),
            RuntimeError::World(e) => e.severity(),
            RuntimeError::Scheduler(e) => e.severity(),
            RuntimeError::InvalidConfig { .. } => ErrorSeverity::Validation,
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Fatal,
        }
    }
}
