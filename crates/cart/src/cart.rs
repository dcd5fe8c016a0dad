use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{DomainError, DomainResult, ProductId, ValueObject};

/// Opaque key of a shopping session. Carts live per session, not per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// A fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a cart. `quantity` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl ValueObject for CartItem {}

/// Cart contents keyed by product, so a product appears at most once.
///
/// A cart carries no owner: it belongs to whichever [`SessionKey`] the
/// store files it under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<ProductId, CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items.get(&product_id).map_or(0, |item| item.quantity)
    }

    /// Add `quantity` to the product's line, creating it if absent.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        match self.items.get_mut(&product_id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::validation("quantity overflow"))?;
            }
            None => {
                self.items.insert(product_id, CartItem { product_id, quantity });
            }
        }
        Ok(())
    }

    /// Replace the quantity of a line. Zero removes it; negatives are rejected.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if quantity == 0 {
            self.items.remove(&product_id);
            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_| DomainError::validation("quantity too large"))?;
        self.items.insert(product_id, CartItem { product_id, quantity });
        Ok(())
    }

    pub fn remove(&mut self, product_id: ProductId) -> DomainResult<()> {
        self.items
            .remove(&product_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("cart item", product_id))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
