//! Optimistic cart consistency engine for a mobile storefront.
//!
//! Keeps a client-side cart in step with a remote document store. Every edit
//! (include in order, change quantity, delete) is applied locally at once,
//! then confirmed against the remote store or rolled back if the call fails.
//! At most one remote call per cart item is outstanding at any time.
//!
//! # Architecture
//!
//! ```text
//! UI event ─► CartAction ─► CartReducer ─► CartItems (optimistic mutation)
//!                               │
//!                               └─► Effect::Future ─► CartGateway
//!                                                        │
//!         CartReducer ◄── *Persisted / *Failed ◄─────────┘
//!              │
//!              └─► finalize, or revert + item-scoped error
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use storefront_cart::{CartAction, CartEnvironment, CartReducer, CartState, UserData};
//! use storefront_cart::mocks::MockCartGateway;
//! use storefront_cart_core::environment::SystemClock;
//! use storefront_cart_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = CartEnvironment::new(MockCartGateway::new(), Arc::new(SystemClock));
//! let store = Store::new(CartState::new(), CartReducer::new(), env);
//!
//! store.send(CartAction::SetUser { user: Some(UserData::new("user-1")) }).await?;
//! let mut handle = store.send(CartAction::LoadCart).await?;
//! handle.wait().await;
//!
//! let total = store.state(|s| s.items.ordering_total()).await;
//! println!("Order total: {total}");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod appwrite;
pub mod cart_store;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mocks;
pub mod reducer;
pub mod state;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use actions::CartAction;
pub use appwrite::AppwriteGateway;
pub use cart_store::{CartItems, RemovedItem};
pub use config::{AppwriteConfig, ConfigError};
pub use error::{CartError, ErrorKind};
pub use gateway::{CartGateway, GatewayError};
pub use reducer::{CartEnvironment, CartReducer};
pub use state::{CartState, ItemError, LoadStatus, PendingOp, Rejection, RowState};
pub use types::{CartItem, CartItemId, ProductId, UserData};
pub use validator::{QuantityEdit, QuantityPhase, StockInputError, validate};
