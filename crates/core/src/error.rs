//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error shared by every component.
///
/// Component crates keep their own richer enums (stock shortages, review
/// rejections) and convert into or wrap this one where the meaning overlaps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (bad quantity, bad rating, empty cart).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller lacks the role or ownership the operation needs.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness or version conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store cannot serve the request (e.g. poisoned lock).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
