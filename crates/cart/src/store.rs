use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bazaar_core::{DomainError, DomainResult, ProductId};

use crate::{Cart, SessionKey};

/// Session-scoped cart storage.
///
/// Every mutation returns a snapshot of the cart after the change. Failed
/// mutations leave the cart untouched.
pub trait CartStore: Send + Sync {
    fn add_item(&self, session: &SessionKey, product_id: ProductId, quantity: u32) -> DomainResult<Cart>;

    fn update_quantity(&self, session: &SessionKey, product_id: ProductId, quantity: i64) -> DomainResult<Cart>;

    fn remove_item(&self, session: &SessionKey, product_id: ProductId) -> DomainResult<Cart>;

    fn clear(&self, session: &SessionKey) -> DomainResult<()>;

    /// Current contents. An unknown session yields an empty cart.
    fn get_items(&self, session: &SessionKey) -> DomainResult<Cart>;
}

impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    fn add_item(&self, session: &SessionKey, product_id: ProductId, quantity: u32) -> DomainResult<Cart> {
        (**self).add_item(session, product_id, quantity)
    }

    fn update_quantity(&self, session: &SessionKey, product_id: ProductId, quantity: i64) -> DomainResult<Cart> {
        (**self).update_quantity(session, product_id, quantity)
    }

    fn remove_item(&self, session: &SessionKey, product_id: ProductId) -> DomainResult<Cart> {
        (**self).remove_item(session, product_id)
    }

    fn clear(&self, session: &SessionKey) -> DomainResult<()> {
        (**self).clear(session)
    }

    fn get_items(&self, session: &SessionKey) -> DomainResult<Cart> {
        (**self).get_items(session)
    }
}

/// Process-local cart store.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<SessionKey, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<F>(&self, session: &SessionKey, f: F) -> DomainResult<Cart>
    where
        F: FnOnce(&mut Cart) -> DomainResult<()>,
    {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| DomainError::unavailable("cart store lock poisoned"))?;

        // Work on a copy so a failed mutation never leaves a partial change.
        let mut cart = carts.get(session).cloned().unwrap_or_default();
        f(&mut cart)?;

        if cart.is_empty() {
            carts.remove(session);
        } else {
            carts.insert(session.clone(), cart.clone());
        }
        Ok(cart)
    }
}

impl CartStore for InMemoryCartStore {
    fn add_item(&self, session: &SessionKey, product_id: ProductId, quantity: u32) -> DomainResult<Cart> {
        let cart = self.mutate(session, |cart| cart.add(product_id, quantity))?;
        tracing::debug!(session = %session, product_id = %product_id, quantity, "cart item added");
        Ok(cart)
    }

    fn update_quantity(&self, session: &SessionKey, product_id: ProductId, quantity: i64) -> DomainResult<Cart> {
        self.mutate(session, |cart| cart.set_quantity(product_id, quantity))
    }

    fn remove_item(&self, session: &SessionKey, product_id: ProductId) -> DomainResult<Cart> {
        self.mutate(session, |cart| cart.remove(product_id))
    }

    fn clear(&self, session: &SessionKey) -> DomainResult<()> {
        self.carts
            .write()
            .map_err(|_| DomainError::unavailable("cart store lock poisoned"))?
            .remove(session);
        Ok(())
    }

    fn get_items(&self, session: &SessionKey) -> DomainResult<Cart> {
        let carts = self
            .carts
            .read()
            .map_err(|_| DomainError::unavailable("cart store lock poisoned"))?;
        Ok(carts.get(session).cloned().unwrap_or_default())
    }
}
