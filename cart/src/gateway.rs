//! Remote cart gateway.
//!
//! The boundary between the reconciliation reducer and the remote document
//! store: one call per logical operation. Implementations perform no retries
//! and mutate no local state; all reconciliation policy lives in the reducer.

use crate::error::ErrorKind;
use crate::types::{CartItem, CartItemId, UserData};
use std::future::Future;
use std::num::NonZeroU32;
use thiserror::Error;

/// Gateway failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The call did not complete (network, auth, server error).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store rejected the write (e.g. stale document).
    #[error("Remote store rejected the write: {0}")]
    Conflict(String),

    /// The response could not be understood.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Classify this error. Undecodable responses count as transport failures.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Decode(_) => ErrorKind::Transport,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

/// Remote document store operations for one user's cart.
///
/// Every method is a single asynchronous call that either completes
/// (document updated) or fails. Timeouts belong to the transport.
pub trait CartGateway: Send + Sync {
    /// Read every cart line owned by `user`, in display order.
    fn load_cart(
        &self,
        user: &UserData,
    ) -> impl Future<Output = Result<Vec<CartItem>, GatewayError>> + Send;

    /// Persist a new `ordering` value for one line.
    fn persist_ordering_toggle(
        &self,
        user: &UserData,
        id: &CartItemId,
        ordering: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Persist a new `stock` value for one line.
    fn persist_stock_change(
        &self,
        user: &UserData,
        id: &CartItemId,
        stock: NonZeroU32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Delete one line.
    fn delete_cart_item(
        &self,
        user: &UserData,
        id: &CartItemId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
