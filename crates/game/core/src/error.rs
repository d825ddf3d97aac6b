//! Common error infrastructure for accord-core.
//!
//! Domain-specific errors (`SchedulerError`, `ProposalError`, `PlanError`,
//! `BodyError`) live beside the component that raises them. This module holds
//! the classification shared by all of them.
//!
//! Feasibility shortfalls are not errors: they are reported through
//! [`crate::plan::Feasibility`] and the caller branches on them.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the world changed under the caller; retrying later may work
/// - **Validation**: the request itself is wrong (unknown keyword, ambiguous selector)
/// - **Internal**: a caller broke a protocol rule (executing an unchecked plan)
/// - **Fatal**: bookkeeping is corrupted and the realm cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a programmer error or corruption.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all accord-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CoreError: std::fmt::Display + std::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
