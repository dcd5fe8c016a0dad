use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use bazaar_core::{OrderId, ProductId, UserId};

use crate::Order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderStoreError {
    #[error("order already exists: {0}")]
    Duplicate(OrderId),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of committed orders.
pub trait OrderRepository: Send + Sync {
    fn save(&self, order: &Order) -> Result<(), OrderStoreError>;

    fn get(&self, id: OrderId) -> Result<Order, OrderStoreError>;

    /// True iff some committed order of `user` contains `product`.
    fn has_purchased(&self, user: UserId, product: ProductId) -> Result<bool, OrderStoreError>;

    /// Orders of `user`, newest first.
    fn orders_for(&self, user: UserId) -> Result<Vec<Order>, OrderStoreError>;
}

impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    fn save(&self, order: &Order) -> Result<(), OrderStoreError> {
        (**self).save(order)
    }

    fn get(&self, id: OrderId) -> Result<Order, OrderStoreError> {
        (**self).get(id)
    }

    fn has_purchased(&self, user: UserId, product: ProductId) -> Result<bool, OrderStoreError> {
        (**self).has_purchased(user, product)
    }

    fn orders_for(&self, user: UserId) -> Result<Vec<Order>, OrderStoreError> {
        (**self).orders_for(user)
    }
}

#[derive(Debug, Default)]
struct OrderTables {
    orders: Vec<Order>,
    by_id: HashMap<OrderId, usize>,
    purchases: HashSet<(UserId, ProductId)>,
}

/// Append-only in-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    inner: RwLock<OrderTables>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, OrderStoreError> {
        Ok(self.read()?.orders.len())
    }

    pub fn is_empty(&self) -> Result<bool, OrderStoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, OrderTables>, OrderStoreError> {
        self.inner
            .read()
            .map_err(|_| OrderStoreError::Unavailable("order store lock poisoned".to_string()))
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut tables = self
            .inner
            .write()
            .map_err(|_| OrderStoreError::Unavailable("order store lock poisoned".to_string()))?;

        let id = order.id_typed();
        if tables.by_id.contains_key(&id) {
            return Err(OrderStoreError::Duplicate(id));
        }

        let index = tables.orders.len();
        tables.orders.push(order.clone());
        tables.by_id.insert(id, index);
        for item in order.items() {
            tables.purchases.insert((order.buyer(), item.product_id));
        }
        tracing::debug!(order_id = %id, buyer = %order.buyer(), lines = order.items().len(), "order saved");
        Ok(())
    }

    fn get(&self, id: OrderId) -> Result<Order, OrderStoreError> {
        let tables = self.read()?;
        tables
            .by_id
            .get(&id)
            .and_then(|&i| tables.orders.get(i))
            .cloned()
            .ok_or(OrderStoreError::NotFound(id))
    }

    fn has_purchased(&self, user: UserId, product: ProductId) -> Result<bool, OrderStoreError> {
        Ok(self.read()?.purchases.contains(&(user, product)))
    }

    fn orders_for(&self, user: UserId) -> Result<Vec<Order>, OrderStoreError> {
        let tables = self.read()?;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.buyer() == user)
            .cloned()
            .collect();
        // Stable: equal timestamps keep latest-saved first.
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use bazaar_core::Money;

    use super::*;
    use crate::OrderItem;

    fn test_order(buyer: UserId, product: ProductId, minutes_ago: i64) -> Order {
        Order::place(
            buyer,
            vec![OrderItem::new(product, 1, Money::from_cents(500))],
            Utc::now() - Duration::minutes(minutes_ago),
        )
        .unwrap()
    }

    #[test]
    fn save_and_get() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order(UserId::new(), ProductId::new(), 0);

        repo.save(&order).unwrap();

        assert_eq!(repo.get(order.id_typed()).unwrap(), order);
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[test]
    fn saving_twice_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order(UserId::new(), ProductId::new(), 0);
        repo.save(&order).unwrap();

        assert_eq!(repo.save(&order), Err(OrderStoreError::Duplicate(order.id_typed())));
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[test]
    fn has_purchased_is_per_user_and_product() {
        let repo = InMemoryOrderRepository::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mug = ProductId::new();
        repo.save(&test_order(alice, mug, 0)).unwrap();

        assert!(repo.has_purchased(alice, mug).unwrap());
        assert!(!repo.has_purchased(bob, mug).unwrap());
        assert!(!repo.has_purchased(alice, ProductId::new()).unwrap());
    }

    #[test]
    fn orders_for_is_newest_first() {
        let repo = InMemoryOrderRepository::new();
        let alice = UserId::new();
        let old = test_order(alice, ProductId::new(), 30);
        let new = test_order(alice, ProductId::new(), 1);
        repo.save(&new).unwrap();
        repo.save(&old).unwrap();
        repo.save(&test_order(UserId::new(), ProductId::new(), 0)).unwrap();

        let ids: Vec<_> = repo.orders_for(alice).unwrap().iter().map(Order::id_typed).collect();
        assert_eq!(ids, vec![new.id_typed(), old.id_typed()]);
    }

    #[test]
    fn unknown_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let id = OrderId::new();
        assert_eq!(repo.get(id), Err(OrderStoreError::NotFound(id)));
    }
}
