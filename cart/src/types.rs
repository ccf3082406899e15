//! Cart domain types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// Identifier of one cart line, assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(String);

impl CartItemId {
    /// Wrap a remote document id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is blank (no identity to address the remote document).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CartItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CartItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Catalog product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap a catalog product id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed-in shopper, supplied by the auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Remote account id; also the owner key of cart documents.
    pub user_id: String,
}

impl UserData {
    /// Create identity for a user id.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Whether the identity can authorize a mutation.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}

/// One purchasable line in the cart.
///
/// Only `stock` and `ordering` change after the item is added; everything
/// else comes from the catalog at add-to-cart time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Stable id of this line.
    pub cart_item_id: CartItemId,
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Image URL.
    pub image: String,
    /// Unit price in whole currency units.
    pub price: u64,
    /// Requested quantity.
    pub stock: NonZeroU32,
    /// Selected options such as size or color, keyed by option name.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Whether the product can be returned.
    #[serde(default)]
    pub returnable: bool,
    /// Whether this line is included in the next checkout.
    #[serde(default)]
    pub ordering: bool,
}

impl CartItem {
    /// Create a line with no options, not returnable and not marked for ordering.
    #[must_use]
    pub fn new(
        cart_item_id: impl Into<CartItemId>,
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: u64,
        stock: NonZeroU32,
    ) -> Self {
        Self {
            cart_item_id: cart_item_id.into(),
            product_id: ProductId::new(product_id),
            name: name.into(),
            image: String::new(),
            price,
            stock,
            options: BTreeMap::new(),
            returnable: false,
            ordering: false,
        }
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Add a selected option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the returnable flag.
    #[must_use]
    pub const fn with_returnable(mut self, returnable: bool) -> Self {
        self.returnable = returnable;
        self
    }

    /// Set the ordering flag.
    #[must_use]
    pub const fn with_ordering(mut self, ordering: bool) -> Self {
        self.ordering = ordering;
        self
    }

    /// `price * stock`, saturating.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.stock.get()))
    }
}
