//! Error types for the cart consistency engine.

use crate::types::CartItemId;
use thiserror::Error;

/// Result type alias for cart store operations.
pub type Result<T> = std::result::Result<T, CartError>;

/// Failure classes, as they drive reconciliation.
///
/// - `Validation` is resolved locally and never reaches the store or network.
/// - `NotFound` is a local cart store invariant violation (unknown or
///   duplicate id): logged, then treated as a no-op.
/// - `Transport` and `Conflict` revert the optimistic change and surface an
///   item-scoped message. They are never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad quantity input.
    Validation,
    /// Cart store id invariant broken.
    NotFound,
    /// Remote call failed (network, auth, server).
    Transport,
    /// Remote store rejected the write.
    Conflict,
}

impl ErrorKind {
    /// Whether an optimistic mutation must be rolled back.
    #[must_use]
    pub const fn requires_rollback(self) -> bool {
        matches!(self, Self::Transport | Self::Conflict)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from cart store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No item with this id in the cart store.
    #[error("Cart item {0} not found")]
    NotFound(CartItemId),

    /// An item with this id is already in the cart store.
    #[error("Cart item {0} already exists")]
    DuplicateId(CartItemId),
}

impl CartError {
    /// Classify this error. Both are local, so neither rolls anything back.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::DuplicateId(_) => ErrorKind::NotFound,
        }
    }
}
