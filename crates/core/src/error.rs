//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure of the order core is recovered into one of these kinds at
/// the service boundary; nothing panics and nothing continues silently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Address missing or not owned by the buyer.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Product missing or inactive.
    #[error("product unavailable: {0}")]
    ProductUnavailable(String),

    /// Requested quantity exceeds available stock.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// Attempted status change not present in the transition table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Buyer acting on another buyer's order, or vendor acting on an order
    /// containing none of their items.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown order / address / product.
    #[error("not found")]
    NotFound,

    /// Concurrent write detected (version mismatch or unique-constraint
    /// violation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence backend failure (connection, IO).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    pub fn product_unavailable(msg: impl Into<String>) -> Self {
        Self::ProductUnavailable(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Machine-readable kind, stable across releases (HTTP error bodies key
    /// off this).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidId(_) => "invalid_id",
            Self::InvalidAddress(_) => "invalid_address",
            Self::ProductUnavailable(_) => "product_unavailable",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage_error",
        }
    }
}
