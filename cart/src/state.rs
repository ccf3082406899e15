//! Cart state as seen by the rendering surface.

use crate::cart_store::{CartItems, RemovedItem};
use crate::error::ErrorKind;
use crate::types::{CartItem, CartItemId, UserData};
use crate::validator::{QuantityEdit, StockInputError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::num::NonZeroU32;

/// The one remote call outstanding for a row, with its rollback snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOp {
    /// `ordering` was flipped; `previous` is the value to restore.
    ToggleOrdering {
        /// Value before the flip
        previous: bool,
    },
    /// `stock` was replaced.
    StockChange {
        /// Value before the change
        previous: NonZeroU32,
        /// Value sent to the remote store
        requested: NonZeroU32,
    },
    /// The line was removed.
    Delete {
        /// Snapshot for re-insertion
        removed: RemovedItem,
    },
}

impl PendingOp {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ToggleOrdering { .. } => "toggle_ordering",
            Self::StockChange { .. } => "stock_change",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Item-scoped failure shown next to the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    /// Failure class
    pub kind: ErrorKind,
    /// User-visible message
    pub message: String,
    /// When the failure was recorded
    pub at: DateTime<Utc>,
}

/// Transient per-row UI state; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowState {
    /// Outstanding remote call, if any (the single-flight marker).
    pub in_flight: Option<PendingOp>,
    /// Last failure for this row.
    pub error: Option<ItemError>,
    /// Quantity editor.
    pub quantity: QuantityEdit,
}

impl RowState {
    /// Row state for a line with the given committed quantity.
    #[must_use]
    pub fn new(stock: NonZeroU32) -> Self {
        Self {
            in_flight: None,
            error: None,
            quantity: QuantityEdit::new(stock),
        }
    }

    /// Whether a remote call is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Why a command was turned away at the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No signed-in user, or a blank item id.
    MissingIdentity,
    /// Another remote call for this item has not resolved.
    InFlight {
        /// Targeted item
        id: CartItemId,
        /// Operation already outstanding
        pending: &'static str,
    },
    /// The item is not in the cart store.
    NotFound {
        /// Targeted item
        id: CartItemId,
    },
    /// The quantity editor has no confirmable value.
    Validation {
        /// Targeted item
        id: CartItemId,
        /// Current validation failure, if the input is invalid
        reason: Option<StockInputError>,
    },
    /// The confirmed quantity equals the committed one.
    Unchanged {
        /// Targeted item
        id: CartItemId,
    },
    /// A reload was requested while remote calls are outstanding.
    LoadBlocked,
    /// The initial read has not resolved; a snapshot taken now would be replaced.
    Loading,
}

impl Rejection {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingIdentity => "missing_identity",
            Self::InFlight { .. } => "in_flight",
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::Unchanged { .. } => "unchanged",
            Self::LoadBlocked => "load_blocked",
            Self::Loading => "loading",
        }
    }
}

/// Progress of the initial cart read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Not requested yet.
    #[default]
    NotLoaded,
    /// Read in flight.
    Loading,
    /// Cart store populated from the remote store.
    Loaded,
    /// Read failed; message for display.
    Failed(String),
}

/// Complete cart state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    /// Signed-in shopper.
    pub user: Option<UserData>,
    /// Cart lines in display order (the source of truth for rendering).
    pub items: CartItems,
    /// Per-row transient state, keyed by item id.
    pub rows: HashMap<CartItemId, RowState>,
    /// Row whose swipe actions are open.
    pub open_row: Option<CartItemId>,
    /// Row the rendering surface should close after another one opened.
    pub close_requested: Option<CartItemId>,
    /// Initial read progress.
    pub load: LoadStatus,
    /// Most recent guard rejection; cleared by the next accepted command.
    pub last_rejection: Option<Rejection>,
}

impl CartState {
    /// Empty, signed-out state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shopper.
    #[must_use]
    pub fn with_user(mut self, user: UserData) -> Self {
        self.user = Some(user);
        self
    }

    /// Populate lines, replacing any existing ones.
    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = CartItem>) -> Self {
        self.items.replace_all(items);
        self.rows.clear();
        self
    }

    /// Row state, if the row has been touched.
    #[must_use]
    pub fn row(&self, id: &CartItemId) -> Option<&RowState> {
        self.rows.get(id)
    }

    /// Row state, created from the line's committed quantity on first use.
    ///
    /// Returns `None` when neither a row nor a line exists for `id`.
    pub fn row_mut(&mut self, id: &CartItemId) -> Option<&mut RowState> {
        if !self.rows.contains_key(id) {
            let stock = self.items.get(id)?.stock;
            self.rows.insert(id.clone(), RowState::new(stock));
        }
        self.rows.get_mut(id)
    }

    /// Whether an operation on this item is outstanding.
    #[must_use]
    pub fn is_in_flight(&self, id: &CartItemId) -> bool {
        self.rows.get(id).is_some_and(RowState::is_busy)
    }

    /// Whether any operation is outstanding.
    #[must_use]
    pub fn any_in_flight(&self) -> bool {
        self.rows.values().any(RowState::is_busy)
    }

    /// Failure shown for this item.
    #[must_use]
    pub fn error_for(&self, id: &CartItemId) -> Option<&ItemError> {
        self.rows.get(id).and_then(|r| r.error.as_ref())
    }
}
