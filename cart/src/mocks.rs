//! In-memory [`CartGateway`] for tests and offline demos.
//!
//! The mock keeps its own copy of the remote documents, records every call,
//! and can be told to fail calls for a given item or to hold them until
//! released, which is how tests keep an operation in flight.

use crate::gateway::{CartGateway, GatewayError};
use crate::types::{CartItem, CartItemId, UserData};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `load_cart`
    LoadCart {
        /// Requesting user
        user_id: String,
    },
    /// `persist_ordering_toggle`
    PersistOrdering {
        /// Targeted item
        id: CartItemId,
        /// Value sent
        ordering: bool,
    },
    /// `persist_stock_change`
    PersistStock {
        /// Targeted item
        id: CartItemId,
        /// Value sent
        stock: NonZeroU32,
    },
    /// `delete_cart_item`
    Delete {
        /// Targeted item
        id: CartItemId,
    },
}

impl GatewayCall {
    /// Item the call targets, if any.
    #[must_use]
    pub const fn item(&self) -> Option<&CartItemId> {
        match self {
            Self::LoadCart { .. } => None,
            Self::PersistOrdering { id, .. } | Self::PersistStock { id, .. } | Self::Delete { id } => {
                Some(id)
            },
        }
    }
}

#[derive(Default)]
struct Remote {
    documents: Vec<CartItem>,
    calls: Vec<GatewayCall>,
    failures: HashMap<CartItemId, GatewayError>,
    load_failure: Option<GatewayError>,
    held: HashSet<CartItemId>,
}

/// Scriptable in-memory gateway.
///
/// Clones share state, so a test can keep one handle for scripting and
/// assertions while the store owns another.
///
/// # Example
///
/// ```
/// use storefront_cart::mocks::MockCartGateway;
/// use storefront_cart::gateway::GatewayError;
///
/// let gateway = MockCartGateway::new();
/// gateway.fail_item("ci-1", GatewayError::Transport("offline".to_string()));
/// assert!(gateway.calls().is_empty());
/// ```
#[derive(Clone)]
pub struct MockCartGateway {
    remote: Arc<Mutex<Remote>>,
    released: Arc<watch::Sender<()>>,
}

impl MockCartGateway {
    /// Empty remote store.
    #[must_use]
    pub fn new() -> Self {
        let (released, _) = watch::channel(());
        Self {
            remote: Arc::new(Mutex::new(Remote::default())),
            released: Arc::new(released),
        }
    }

    /// Remote store pre-populated with `items`.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let gateway = Self::new();
        gateway.lock().documents.extend(items);
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, Remote> {
        self.remote.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every call targeting `id` with `error` until cleared.
    pub fn fail_item(&self, id: impl Into<CartItemId>, error: GatewayError) {
        self.lock().failures.insert(id.into(), error);
    }

    /// Let calls targeting `id` succeed again.
    pub fn clear_failure(&self, id: &CartItemId) {
        self.lock().failures.remove(id);
    }

    /// Fail the next cart reads with `error`.
    pub fn fail_load(&self, error: GatewayError) {
        self.lock().load_failure = Some(error);
    }

    /// Hold calls targeting `id` until [`release`](Self::release).
    pub fn hold(&self, id: impl Into<CartItemId>) {
        self.lock().held.insert(id.into());
    }

    /// Let held calls targeting `id` resolve.
    pub fn release(&self, id: &CartItemId) {
        self.lock().held.remove(id);
        self.released.send_replace(());
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Calls made so far that target `id`.
    #[must_use]
    pub fn calls_for(&self, id: &CartItemId) -> Vec<GatewayCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.item() == Some(id))
            .cloned()
            .collect()
    }

    /// Current remote documents.
    #[must_use]
    pub fn documents(&self) -> Vec<CartItem> {
        self.lock().documents.clone()
    }

    fn record(&self, call: GatewayCall) {
        self.lock().calls.push(call);
    }

    fn is_held(&self, id: &CartItemId) -> bool {
        self.lock().held.contains(id)
    }

    async fn pass_gate(&self, id: &CartItemId) {
        let mut released = self.released.subscribe();
        while self.is_held(id) {
            if released.changed().await.is_err() {
                break;
            }
        }
    }

    /// Apply `update` to the document for `id`, honouring scripted failures.
    fn apply<F>(&self, id: &CartItemId, update: F) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut Vec<CartItem>, usize),
    {
        let mut remote = self.lock();
        if let Some(error) = remote.failures.get(id) {
            return Err(error.clone());
        }
        let index = remote
            .documents
            .iter()
            .position(|doc| &doc.cart_item_id == id)
            .ok_or_else(|| GatewayError::Transport(format!("HTTP 404: Document {id} not found")))?;
        update(&mut remote.documents, index);
        Ok(())
    }
}

impl Default for MockCartGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockCartGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let remote = self.lock();
        f.debug_struct("MockCartGateway")
            .field("documents", &remote.documents.len())
            .field("calls", &remote.calls.len())
            .finish_non_exhaustive()
    }
}

impl CartGateway for MockCartGateway {
    fn load_cart(
        &self,
        user: &UserData,
    ) -> impl Future<Output = Result<Vec<CartItem>, GatewayError>> + Send {
        let this = self.clone();
        let user_id = user.user_id.clone();
        async move {
            this.record(GatewayCall::LoadCart { user_id });
            let remote = this.lock();
            match &remote.load_failure {
                Some(error) => Err(error.clone()),
                None => Ok(remote.documents.clone()),
            }
        }
    }

    fn persist_ordering_toggle(
        &self,
        _user: &UserData,
        id: &CartItemId,
        ordering: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        let this = self.clone();
        let id = id.clone();
        async move {
            this.record(GatewayCall::PersistOrdering { id: id.clone(), ordering });
            this.pass_gate(&id).await;
            this.apply(&id, |docs, i| docs[i].ordering = ordering)
        }
    }

    fn persist_stock_change(
        &self,
        _user: &UserData,
        id: &CartItemId,
        stock: NonZeroU32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        let this = self.clone();
        let id = id.clone();
        async move {
            this.record(GatewayCall::PersistStock { id: id.clone(), stock });
            this.pass_gate(&id).await;
            this.apply(&id, |docs, i| docs[i].stock = stock)
        }
    }

    fn delete_cart_item(
        &self,
        _user: &UserData,
        id: &CartItemId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        let this = self.clone();
        let id = id.clone();
        async move {
            this.record(GatewayCall::Delete { id: id.clone() });
            this.pass_gate(&id).await;
            this.apply(&id, |docs, i| {
                docs.remove(i);
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> UserData {
        UserData::new("user-1")
    }

    fn item(id: &str) -> CartItem {
        CartItem::new(id, "p", id, 100, NonZeroU32::MIN)
    }

    #[tokio::test]
    async fn test_successful_calls_update_documents() {
        let gateway = MockCartGateway::with_items([item("a"), item("b")]);
        let a = CartItemId::new("a");

        gateway.persist_ordering_toggle(&user(), &a, true).await.unwrap();
        gateway
            .persist_stock_change(&user(), &a, NonZeroU32::new(4).unwrap())
            .await
            .unwrap();
        gateway.delete_cart_item(&user(), &CartItemId::new("b")).await.unwrap();

        let docs = gateway.documents();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].ordering);
        assert_eq!(docs[0].stock.get(), 4);
        assert_eq!(gateway.calls_for(&a).len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let gateway = MockCartGateway::with_items([item("a")]);
        let a = CartItemId::new("a");
        gateway.fail_item("a", GatewayError::Conflict("stale".to_string()));

        let err = gateway.delete_cart_item(&user(), &a).await.unwrap_err();
        assert_eq!(err, GatewayError::Conflict("stale".to_string()));
        assert_eq!(gateway.documents().len(), 1);

        gateway.clear_failure(&a);
        assert!(gateway.delete_cart_item(&user(), &a).await.is_ok());

        let missing = gateway.delete_cart_item(&user(), &a).await.unwrap_err();
        assert!(matches!(missing, GatewayError::Transport(_)));

        gateway.fail_load(GatewayError::Transport("offline".to_string()));
        assert!(gateway.load_cart(&user()).await.is_err());
    }

    #[tokio::test]
    async fn test_held_calls_wait_for_release() {
        let gateway = MockCartGateway::with_items([item("a")]);
        let a = CartItemId::new("a");
        gateway.hold("a");

        let call = {
            let gateway = gateway.clone();
            let a = a.clone();
            tokio::spawn(async move { gateway.persist_ordering_toggle(&user(), &a, true).await })
        };

        tokio::task::yield_now().await;
        assert!(!gateway.documents()[0].ordering);

        gateway.release(&a);
        call.await.unwrap().unwrap();
        assert!(gateway.documents()[0].ordering);
    }
}
