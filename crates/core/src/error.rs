//! Domain error model.

use thiserror::Error;

/// Result type used across the catalogue crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Template rendering and combination generation never produce these; they
/// surface from session state transitions and shelf lifecycle commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a blank product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. committing before generating).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced row or product does not exist.
    #[error("not found")]
    NotFound,

    /// The requested change conflicts with current state (stale version,
    /// terminal session, no-op status change).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
