//! In-memory, ordered collection of cart lines.
//!
//! Every mutation returns what is needed to undo it, which is what lets the
//! reconciliation reducer apply changes optimistically and roll them back
//! without re-fetching remote state.

use crate::error::{CartError, Result};
use crate::types::{CartItem, CartItemId};
use std::num::NonZeroU32;

/// Snapshot of a removed line, enough to put it back where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedItem {
    item: CartItem,
    index: usize,
    next: Option<CartItemId>,
}

impl RemovedItem {
    /// The removed line.
    #[must_use]
    pub const fn item(&self) -> &CartItem {
        &self.item
    }

    /// Position the line had when it was removed.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Cart lines in display order.
///
/// Ids are unique within the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartItems {
    items: Vec<CartItem>,
}

impl CartItems {
    /// Empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from a list, dropping later duplicates of an id.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        cart.replace_all(items);
        cart
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Line ids in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<CartItemId> {
        self.items.iter().map(|i| i.cart_item_id.clone()).collect()
    }

    /// Display position of a line.
    #[must_use]
    pub fn position(&self, id: &CartItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.cart_item_id == id)
    }

    /// Look up a line.
    #[must_use]
    pub fn get(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.cart_item_id == id)
    }

    /// Whether a line with this id exists.
    #[must_use]
    pub fn contains(&self, id: &CartItemId) -> bool {
        self.position(id).is_some()
    }

    fn get_mut(&mut self, id: &CartItemId) -> Result<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| &i.cart_item_id == id)
            .ok_or_else(|| CartError::NotFound(id.clone()))
    }

    /// Flip `ordering` for one line, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id.
    pub fn toggle_ordering(&mut self, id: &CartItemId) -> Result<bool> {
        let item = self.get_mut(id)?;
        let previous = item.ordering;
        item.ordering = !previous;
        Ok(previous)
    }

    /// Set `ordering` for one line, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id.
    pub fn set_ordering(&mut self, id: &CartItemId, ordering: bool) -> Result<bool> {
        let item = self.get_mut(id)?;
        Ok(std::mem::replace(&mut item.ordering, ordering))
    }

    /// Replace `stock` for one line, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id.
    pub fn set_stock(&mut self, id: &CartItemId, stock: NonZeroU32) -> Result<NonZeroU32> {
        let item = self.get_mut(id)?;
        Ok(std::mem::replace(&mut item.stock, stock))
    }

    /// Remove one line, keeping the relative order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id.
    pub fn remove(&mut self, id: &CartItemId) -> Result<RemovedItem> {
        let index = self
            .position(id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        let item = self.items.remove(index);
        let next = self.items.get(index).map(|i| i.cart_item_id.clone());

        Ok(RemovedItem { item, index, next })
    }

    /// Put a removed line back, returning where it landed.
    ///
    /// The line goes in front of the line that followed it at removal time.
    /// If that line is gone too, the original index is used, clamped to the
    /// current length. This keeps the original order when several removals
    /// are undone in any order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::DuplicateId`] if the id is already present.
    pub fn restore(&mut self, removed: RemovedItem) -> Result<usize> {
        let RemovedItem { item, index, next } = removed;
        if self.contains(&item.cart_item_id) {
            return Err(CartError::DuplicateId(item.cart_item_id));
        }

        let at = next
            .and_then(|next| self.position(&next))
            .unwrap_or_else(|| index.min(self.items.len()));
        self.items.insert(at, item);
        Ok(at)
    }

    /// Append a newly added line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::DuplicateId`] if the id is already present.
    pub fn insert(&mut self, item: CartItem) -> Result<()> {
        if self.contains(&item.cart_item_id) {
            return Err(CartError::DuplicateId(item.cart_item_id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace all lines, returning how many duplicates were dropped.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = CartItem>) -> usize {
        self.items.clear();
        let mut dropped = 0;
        for item in items {
            if let Err(error) = self.insert(item) {
                tracing::warn!(%error, "Dropping duplicate cart item");
                dropped += 1;
            }
        }
        dropped
    }

    /// Lines marked for the next checkout.
    pub fn ordering_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|i| i.ordering)
    }

    /// Sum of line totals marked for the next checkout, saturating.
    #[must_use]
    pub fn ordering_total(&self) -> u64 {
        self.ordering_items()
            .fold(0_u64, |total, item| total.saturating_add(item.line_total()))
    }
}

impl<'a> IntoIterator for &'a CartItems {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
