//! # DomainError
//!
//! Centralized error handling for the Volunteer Hub ecosystem.
//! Every port and service returns this type; the API layer maps it to a status code.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Opportunity, Application, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Missing or malformed input (e.g., empty feedback)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller's role or ownership does not allow the operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., second application to the same opportunity)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record is not in the state the transition requires
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Volunteer Hub logic.
pub type Result<T> = std::result::Result<T, DomainError>;
