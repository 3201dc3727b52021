//! # AppError
//!
//! Centralized error handling for the Rusty-Forum ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all rf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A field violated its length bounds (e.g., topic name, post text)
    #[error("{field} must be {min}-{max} characters, got {actual}")]
    InvalidLength {
        field: &'static str,
        actual: usize,
        min: usize,
        max: usize,
    },

    /// Any other validation failure (e.g., page size of zero)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced entity absent (e.g., Topic, Post, Comment)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Authorization predicate failed. Never downgraded to NotFound.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Identity could not be established at all
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Concurrent-mutation race on the same aggregate. Not retried here;
    /// retry policy belongs to the caller.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., store down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for Rusty-Forum logic.
pub type Result<T> = std::result::Result<T, AppError>;
