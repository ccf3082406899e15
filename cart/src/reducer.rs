//! Reconciliation reducer.
//!
//! Every mutating command runs the same three phases:
//!
//! 1. **Guard**: reject without mutation or I/O when identity is missing, the
//!    item already has a remote call outstanding, or the item is unknown.
//! 2. **Optimistic apply**: mutate the cart store and keep the rollback
//!    snapshot in the row's in-flight marker.
//! 3. **Confirm or compensate**: a `Future` effect calls the gateway and feeds
//!    back a persisted/failed event. Success clears the marker; failure
//!    applies the inverse operation and records an item-scoped error.
//!
//! The in-flight marker is per item, so operations on different items never
//! wait on each other.

use crate::actions::CartAction;
use crate::gateway::{CartGateway, GatewayError};
use crate::state::{CartState, ItemError, LoadStatus, PendingOp, Rejection};
use crate::types::{CartItemId, UserData};
use std::marker::PhantomData;
use std::sync::Arc;
use storefront_cart_core::{
    SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};

/// Environment dependencies for the cart reducer
#[derive(Clone)]
pub struct CartEnvironment<G> {
    /// Remote cart gateway
    pub gateway: G,
    /// Clock for timestamping item errors
    pub clock: Arc<dyn Clock>,
}

impl<G> CartEnvironment<G> {
    /// Creates a new `CartEnvironment`
    #[must_use]
    pub fn new(gateway: G, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }
}

type Effects = SmallVec<[Effect<CartAction>; 4]>;

/// Reducer for the cart
#[derive(Debug)]
pub struct CartReducer<G> {
    _gateway: PhantomData<fn() -> G>,
}

impl<G> CartReducer<G> {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _gateway: PhantomData,
        }
    }
}

impl<G> Default for CartReducer<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Clone for CartReducer<G> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<G> CartReducer<G>
where
    G: CartGateway + Clone + 'static,
{
    /// Phase 1 for item commands. Returns the identity to authorize the call.
    fn guard(state: &CartState, id: &CartItemId) -> Result<UserData, Rejection> {
        let user = state
            .user
            .as_ref()
            .filter(|user| user.is_present() && !id.is_blank())
            .ok_or(Rejection::MissingIdentity)?;

        if state.load == LoadStatus::Loading {
            return Err(Rejection::Loading);
        }

        if let Some(pending) = state.row(id).and_then(|row| row.in_flight.as_ref()) {
            return Err(Rejection::InFlight {
                id: id.clone(),
                pending: pending.name(),
            });
        }

        if !state.items.contains(id) {
            return Err(Rejection::NotFound { id: id.clone() });
        }

        Ok(user.clone())
    }

    fn reject(state: &mut CartState, rejection: Rejection) -> Effects {
        tracing::warn!(reason = rejection.reason(), ?rejection, "Cart command rejected");
        metrics::counter!("cart.guard.rejected", "reason" => rejection.reason()).increment(1);
        state.last_rejection = Some(rejection);
        smallvec![Effect::None]
    }

    /// Mark `id` busy with `op` and clear any stale failure.
    fn begin(state: &mut CartState, id: &CartItemId, op: PendingOp) {
        tracing::debug!(item = %id, op = op.name(), "Optimistic change applied");
        state.last_rejection = None;
        if let Some(row) = state.row_mut(id) {
            row.in_flight = Some(op);
            row.error = None;
        }
    }

    /// Take the in-flight marker for a feedback event.
    fn settle(state: &mut CartState, id: &CartItemId) -> Option<PendingOp> {
        let pending = state.rows.get_mut(id).and_then(|row| row.in_flight.take());
        if pending.is_none() {
            tracing::warn!(item = %id, "Remote outcome for an item with nothing in flight");
        }
        pending
    }

    /// Record an item-scoped failure after compensation.
    fn fail(
        state: &mut CartState,
        id: &CartItemId,
        error: &GatewayError,
        what: &str,
        env: &CartEnvironment<G>,
    ) {
        let kind = error.kind();
        tracing::warn!(item = %id, %kind, %error, "Remote call failed, change reverted");
        if let Some(row) = state.rows.get_mut(id) {
            row.error = Some(ItemError {
                kind,
                message: format!("Could not {what}. Please try again."),
                at: env.clock.now(),
            });
        }
    }

    fn set_user(state: &mut CartState, user: Option<UserData>) -> Effects {
        let user = user.filter(UserData::is_present);
        if user != state.user {
            tracing::info!(signed_in = user.is_some(), "Cart identity changed");
            *state = CartState {
                user,
                ..CartState::default()
            };
        }
        smallvec![Effect::None]
    }

    fn load_cart(state: &mut CartState, env: &CartEnvironment<G>) -> Effects {
        let Some(user) = state.user.clone() else {
            return Self::reject(state, Rejection::MissingIdentity);
        };
        if state.any_in_flight() {
            return Self::reject(state, Rejection::LoadBlocked);
        }
        if state.load == LoadStatus::Loading {
            return smallvec![Effect::None];
        }

        state.load = LoadStatus::Loading;
        state.last_rejection = None;

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            let result = gateway.load_cart(&user).await;
            Some(match result {
                Ok(items) => CartAction::CartLoaded { user, items },
                Err(error) => CartAction::CartLoadFailed { user, error },
            })
        })]
    }

    /// Whether a read made for `user` still belongs to the current state.
    fn awaiting_load(state: &CartState, user: &UserData) -> bool {
        state.load == LoadStatus::Loading && state.user.as_ref() == Some(user)
    }

    fn toggle_ordering(
        state: &mut CartState,
        id: CartItemId,
        env: &CartEnvironment<G>,
    ) -> Effects {
        let user = match Self::guard(state, &id) {
            Ok(user) => user,
            Err(rejection) => return Self::reject(state, rejection),
        };
        let Ok(previous) = state.items.toggle_ordering(&id) else {
            return Self::reject(state, Rejection::NotFound { id });
        };
        Self::begin(state, &id, PendingOp::ToggleOrdering { previous });

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            let result = gateway.persist_ordering_toggle(&user, &id, !previous).await;
            Some(match result {
                Ok(()) => CartAction::OrderingPersisted { id },
                Err(error) => CartAction::OrderingPersistFailed { id, error },
            })
        })]
    }

    fn delete_item(state: &mut CartState, id: CartItemId, env: &CartEnvironment<G>) -> Effects {
        let user = match Self::guard(state, &id) {
            Ok(user) => user,
            Err(rejection) => return Self::reject(state, rejection),
        };
        // Row state must exist before the line leaves the store
        if state.row_mut(&id).is_none() {
            return Self::reject(state, Rejection::NotFound { id });
        }
        let Ok(removed) = state.items.remove(&id) else {
            return Self::reject(state, Rejection::NotFound { id });
        };
        Self::begin(state, &id, PendingOp::Delete { removed });

        if state.open_row.as_ref() == Some(&id) {
            state.open_row = None;
        }
        if state.close_requested.as_ref() == Some(&id) {
            state.close_requested = None;
        }

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            let result = gateway.delete_cart_item(&user, &id).await;
            Some(match result {
                Ok(()) => CartAction::ItemDeleted { id },
                Err(error) => CartAction::DeleteFailed { id, error },
            })
        })]
    }

    fn quantity_input(state: &mut CartState, id: &CartItemId, text: String) -> Effects {
        let Some(row) = state.row_mut(id) else {
            return Self::reject(state, Rejection::NotFound { id: id.clone() });
        };
        row.quantity.on_input(text);
        state.last_rejection = None;
        smallvec![Effect::None]
    }

    fn confirm_quantity(
        state: &mut CartState,
        id: CartItemId,
        env: &CartEnvironment<G>,
    ) -> Effects {
        let user = match Self::guard(state, &id) {
            Ok(user) => user,
            Err(rejection) => return Self::reject(state, rejection),
        };
        let Some(committed) = state.items.get(&id).map(|item| item.stock) else {
            return Self::reject(state, Rejection::NotFound { id });
        };
        let Some(row) = state.row_mut(&id) else {
            return Self::reject(state, Rejection::NotFound { id });
        };

        if !row.quantity.can_confirm() {
            let reason = row.quantity.error();
            return Self::reject(state, Rejection::Validation { id, reason });
        }
        if row.quantity.candidate() == Some(committed) {
            row.quantity.reset(committed);
            return Self::reject(state, Rejection::Unchanged { id });
        }
        let Some(requested) = row.quantity.begin_confirm() else {
            return Self::reject(state, Rejection::Validation { id, reason: None });
        };

        let Ok(previous) = state.items.set_stock(&id, requested) else {
            return Self::reject(state, Rejection::NotFound { id });
        };
        Self::begin(state, &id, PendingOp::StockChange { previous, requested });

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            let result = gateway.persist_stock_change(&user, &id, requested).await;
            Some(match result {
                Ok(()) => CartAction::StockPersisted { id },
                Err(error) => CartAction::StockPersistFailed { id, error },
            })
        })]
    }

    fn swipe_opened(state: &mut CartState, id: CartItemId) -> Effects {
        if !state.items.contains(&id) {
            return Self::reject(state, Rejection::NotFound { id });
        }
        let previous = state.open_row.replace(id.clone());
        state.close_requested = previous.filter(|previous| *previous != id);
        smallvec![Effect::None]
    }

    fn swipe_closed(state: &mut CartState, id: &CartItemId) -> Effects {
        if state.open_row.as_ref() == Some(id) {
            state.open_row = None;
        }
        if state.close_requested.as_ref() == Some(id) {
            state.close_requested = None;
        }
        smallvec![Effect::None]
    }
}

impl<G> Reducer for CartReducer<G>
where
    G: CartGateway + Clone + 'static,
{
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment<G>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            CartAction::SetUser { user } => Self::set_user(state, user),
            CartAction::LoadCart => Self::load_cart(state, env),
            CartAction::ToggleOrdering { id } => Self::toggle_ordering(state, id, env),
            CartAction::DeleteItem { id } => Self::delete_item(state, id, env),
            CartAction::QuantityInput { id, text } => Self::quantity_input(state, &id, text),
            CartAction::ConfirmQuantity { id } => Self::confirm_quantity(state, id, env),
            CartAction::SwipeOpened { id } => Self::swipe_opened(state, id),
            CartAction::SwipeClosed { id } => Self::swipe_closed(state, &id),
            CartAction::ItemAdded { item } => {
                let id = item.cart_item_id.clone();
                if let Err(error) = state.items.insert(item) {
                    tracing::warn!(item = %id, %error, "Ignoring added item");
                }
                smallvec![Effect::None]
            },
            CartAction::DismissError { id } => {
                if let Some(row) = state.rows.get_mut(&id) {
                    row.error = None;
                }
                smallvec![Effect::None]
            },

            // ========== Remote outcomes ==========
            CartAction::CartLoaded { user, items } => {
                if !Self::awaiting_load(state, &user) {
                    tracing::warn!("Cart read resolved after the cart was reset");
                    return smallvec![Effect::None];
                }
                let dropped = state.items.replace_all(items);
                state.rows.clear();
                state.open_row = None;
                state.close_requested = None;
                state.load = LoadStatus::Loaded;
                tracing::info!(items = state.items.len(), dropped, "Cart loaded");
                smallvec![Effect::None]
            },
            CartAction::CartLoadFailed { user, error } => {
                if Self::awaiting_load(state, &user) {
                    tracing::warn!(%error, "Cart read failed");
                    state.load = LoadStatus::Failed(error.to_string());
                }
                smallvec![Effect::None]
            },
            CartAction::OrderingPersisted { id } => {
                if let Some(PendingOp::ToggleOrdering { .. }) = Self::settle(state, &id) {
                    metrics::counter!("cart.remote.confirmed", "op" => "toggle_ordering").increment(1);
                }
                smallvec![Effect::None]
            },
            CartAction::OrderingPersistFailed { id, error } => {
                if let Some(PendingOp::ToggleOrdering { previous }) = Self::settle(state, &id) {
                    if let Err(e) = state.items.set_ordering(&id, previous) {
                        tracing::warn!(item = %id, error = %e, "Cannot revert ordering");
                    }
                    Self::fail(state, &id, &error, "update the order selection", env);
                    metrics::counter!("cart.remote.compensated", "op" => "toggle_ordering").increment(1);
                }
                smallvec![Effect::None]
            },
            CartAction::StockPersisted { id } => {
                if let Some(PendingOp::StockChange { requested, .. }) = Self::settle(state, &id) {
                    if let Some(row) = state.rows.get_mut(&id) {
                        row.quantity.confirmed(requested);
                    }
                    metrics::counter!("cart.remote.confirmed", "op" => "stock_change").increment(1);
                }
                smallvec![Effect::None]
            },
            CartAction::StockPersistFailed { id, error } => {
                if let Some(PendingOp::StockChange { previous, .. }) = Self::settle(state, &id) {
                    if let Err(e) = state.items.set_stock(&id, previous) {
                        tracing::warn!(item = %id, error = %e, "Cannot revert quantity");
                    }
                    if let Some(row) = state.rows.get_mut(&id) {
                        row.quantity.failed();
                    }
                    Self::fail(state, &id, &error, "update the quantity", env);
                    metrics::counter!("cart.remote.compensated", "op" => "stock_change").increment(1);
                }
                smallvec![Effect::None]
            },
            CartAction::ItemDeleted { id } => {
                if let Some(PendingOp::Delete { .. }) = Self::settle(state, &id) {
                    state.rows.remove(&id);
                    metrics::counter!("cart.remote.confirmed", "op" => "delete").increment(1);
                }
                smallvec![Effect::None]
            },
            CartAction::DeleteFailed { id, error } => {
                if let Some(PendingOp::Delete { removed }) = Self::settle(state, &id) {
                    if let Err(e) = state.items.restore(removed) {
                        tracing::warn!(item = %id, error = %e, "Cannot restore deleted item");
                    }
                    Self::fail(state, &id, &error, "remove this item", env);
                    metrics::counter!("cart.remote.compensated", "op" => "delete").increment(1);
                }
                smallvec![Effect::None]
            },
        }
    }
}
