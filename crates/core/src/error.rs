//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is deterministic and surfaced to the caller as-is; nothing
/// here is transient or retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing required input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An id did not resolve to a known entity.
    #[error("not found: {0}")]
    NotFound(String),

    /// A business rule refused the operation (e.g. busy performer).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Illegal state transition (e.g. completing a completed assignment).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An entity with the same identity already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code, used by transports.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Unavailable(_) => "unavailable",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::Conflict(_) => "conflict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_distinguish_every_kind() {
        let all = [
            DomainError::validation("x"),
            DomainError::not_found("x"),
            DomainError::unavailable("x"),
            DomainError::invalid_state("x"),
            DomainError::conflict("x"),
        ];
        let mut codes: Vec<_> = all.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn display_carries_detail() {
        let err = DomainError::unavailable("performer p3 is busy");
        assert_eq!(err.to_string(), "unavailable: performer p3 is busy");
    }
}
