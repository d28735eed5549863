//! Unified error handling
//!
//! Provides the application-wide error taxonomy:
//! - [`AppError`] - application error enum
//! - [`AppResult`] - result alias used across all services
//!
//! Per-order failures inside a sync batch are caught and logged by the
//! engine, never propagated. Everything else surfaces as an `AppError`
//! with a human-readable message and a machine-checkable kind.

use crate::store::StoreError;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Input Errors ==========
    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    // ========== System Errors ==========
    #[error("Remote source error: {0}")]
    Remote(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AppError {
    /// Stable machine-checkable kind, independent of the message text
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::Remote(_) => "remote",
            AppError::Persistence(_) => "persistence",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Persistence(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
