//! Cart actions: user commands and remote outcomes.

use crate::gateway::GatewayError;
use crate::types::{CartItem, CartItemId, UserData};

/// Everything the cart reducer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    // ========== Commands ==========
    /// Sign-in state changed.
    SetUser {
        /// New identity, `None` when signed out
        user: Option<UserData>,
    },
    /// Populate the cart from the remote store.
    LoadCart,
    /// Flip an item's inclusion in the next checkout.
    ToggleOrdering {
        /// Targeted item
        id: CartItemId,
    },
    /// Remove an item (swipe-to-delete).
    DeleteItem {
        /// Targeted item
        id: CartItemId,
    },
    /// One keystroke in an item's quantity input.
    QuantityInput {
        /// Targeted item
        id: CartItemId,
        /// Full input text after the keystroke
        text: String,
    },
    /// Send the validated quantity.
    ConfirmQuantity {
        /// Targeted item
        id: CartItemId,
    },
    /// A row's swipe actions opened.
    SwipeOpened {
        /// Row that opened
        id: CartItemId,
    },
    /// A row's swipe actions closed.
    SwipeClosed {
        /// Row that closed
        id: CartItemId,
    },
    /// An item was added to the cart elsewhere and already persisted.
    ItemAdded {
        /// The new line
        item: CartItem,
    },
    /// Hide an item's failure indicator.
    DismissError {
        /// Targeted item
        id: CartItemId,
    },

    // ========== Remote outcomes ==========
    /// Initial read succeeded.
    CartLoaded {
        /// Identity the read was made for
        user: UserData,
        /// Lines in display order
        items: Vec<CartItem>,
    },
    /// Initial read failed.
    CartLoadFailed {
        /// Identity the read was made for
        user: UserData,
        /// Cause
        error: GatewayError,
    },
    /// Remote store accepted an ordering change.
    OrderingPersisted {
        /// Targeted item
        id: CartItemId,
    },
    /// Remote store did not accept an ordering change.
    OrderingPersistFailed {
        /// Targeted item
        id: CartItemId,
        /// Cause
        error: GatewayError,
    },
    /// Remote store accepted a quantity change.
    StockPersisted {
        /// Targeted item
        id: CartItemId,
    },
    /// Remote store did not accept a quantity change.
    StockPersistFailed {
        /// Targeted item
        id: CartItemId,
        /// Cause
        error: GatewayError,
    },
    /// Remote store deleted the item.
    ItemDeleted {
        /// Targeted item
        id: CartItemId,
    },
    /// Remote store did not delete the item.
    DeleteFailed {
        /// Targeted item
        id: CartItemId,
        /// Cause
        error: GatewayError,
    },
}
