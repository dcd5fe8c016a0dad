//! Checkout pipeline.
//!
//! ```text
//! cart snapshot
//!   ↓
//! 1. Pending: reject an empty cart
//!   ↓
//! 2. Validating: snapshot prices, reserve every line in one ledger step
//!    (all or none), report every shortage
//!   ↓
//! 3. Committing: build the order, persist it, commit the stock
//!    transaction, clear the cart
//!   ↓
//! 4. Completed: fire post-commit hooks (invoice, bus), outside the
//!    transaction and unable to fail the checkout
//! ```
//!
//! Other checkouts never see a partial reservation. Any failure after the
//! reservation and before its commit drops the transaction, which puts back
//! every unit taken in this attempt. The cart is only cleared after the
//! order is durable, so a failed attempt can simply be retried.

use chrono::Utc;
use tracing::instrument;

use bazaar_auth::Identity;
use bazaar_cart::{Cart, CartStore, SessionKey};
use bazaar_catalog::CatalogService;
use bazaar_events::HookRegistry;
use bazaar_inventory::{InventoryLedger, StockError, StockTransaction};
use bazaar_sales::{Order, OrderItem, OrderPlaced, OrderRepository};

use crate::CheckoutError;
use crate::state::{Attempt, CheckoutState};

/// Orchestrates cart, ledger, order store and catalog into one atomic
/// cart-to-order transition.
///
/// The engine holds no state of its own beyond its collaborators, so one
/// instance can serve any number of concurrent checkouts. Contention is
/// resolved by the ledger's all-lines atomic decrement.
pub struct CheckoutEngine<C, I, O, P> {
    carts: C,
    ledger: I,
    orders: O,
    catalog: P,
    on_placed: HookRegistry<OrderPlaced>,
}

impl<C, I, O, P> CheckoutEngine<C, I, O, P> {
    pub fn new(carts: C, ledger: I, orders: O, catalog: P) -> Self {
        Self {
            carts,
            ledger,
            orders,
            catalog,
            on_placed: HookRegistry::new(),
        }
    }

    /// Replace the hooks fired after an order commits.
    pub fn with_hooks(mut self, on_placed: HookRegistry<OrderPlaced>) -> Self {
        self.on_placed = on_placed;
        self
    }
}

impl<C, I, O, P> CheckoutEngine<C, I, O, P>
where
    C: CartStore,
    I: InventoryLedger,
    O: OrderRepository,
    P: CatalogService,
{
    /// Turn the cart of `session` into a paid order for `buyer`.
    ///
    /// On success exactly one order exists, stock is reduced by exactly the
    /// cart quantities and the cart is empty. On failure none of that
    /// happened and the cart is untouched.
    #[instrument(skip(self, session, buyer), fields(session = %session, buyer = %buyer.id))]
    pub fn checkout(&self, session: &SessionKey, buyer: &Identity) -> Result<Order, CheckoutError> {
        let mut attempt = Attempt::start();

        let cart = self
            .carts
            .get_items(session)
            .map_err(|e| attempt.fail(CheckoutError::from(e)))?;
        if cart.is_empty() {
            return Err(attempt.fail(CheckoutError::EmptyCart));
        }

        attempt.enter(CheckoutState::Validating);
        let items = self
            .snapshot_prices(&cart)
            .map_err(|e| attempt.fail(e))?;

        let lines: Vec<_> = items.iter().map(|item| (item.product_id, item.quantity)).collect();
        let mut stock = StockTransaction::begin(&self.ledger);
        if let Err(err) = stock.reserve(&lines) {
            if let StockError::OutOfStock(shortages) = &err {
                tracing::info!(
                    shortages = shortages.len(),
                    lines = lines.len(),
                    "checkout rejected: insufficient stock"
                );
            }
            return Err(attempt.fail(CheckoutError::from(err)));
        }

        attempt.enter(CheckoutState::Committing);
        let order = Order::place(buyer.id, items, Utc::now()).map_err(|e| attempt.fail(CheckoutError::from(e)))?;
        self.orders
            .save(&order)
            .map_err(|e| attempt.fail(CheckoutError::from(e)))?;
        stock.commit();

        // The order is durable from here on; a stale cart must not undo it.
        if let Err(err) = self.carts.clear(session) {
            tracing::warn!(order_id = %order.id_typed(), error = %err, "failed to clear cart after checkout");
        }

        attempt.enter(CheckoutState::Completed);
        tracing::info!(
            order_id = %order.id_typed(),
            lines = order.items().len(),
            total = %order.total(),
            "order placed"
        );

        let failed_hooks = self.on_placed.fire(&OrderPlaced {
            order: order.clone(),
            buyer_username: buyer.username.clone(),
            buyer_email: buyer.email.clone(),
            occurred_at: order.created_at(),
        });
        if failed_hooks > 0 {
            tracing::warn!(order_id = %order.id_typed(), failed_hooks, "order placed with failing hooks");
        }

        Ok(order)
    }

    /// One order line per cart line, at the catalog's current price.
    fn snapshot_prices(&self, cart: &Cart) -> Result<Vec<OrderItem>, CheckoutError> {
        cart.items()
            .map(|line| -> Result<OrderItem, CheckoutError> {
                let product = self.catalog.product(line.product_id)?;
                Ok(OrderItem::new(line.product_id, line.quantity, product.price))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    use bazaar_auth::Role;
    use bazaar_cart::InMemoryCartStore;
    use bazaar_catalog::InMemoryCatalog;
    use bazaar_core::{DomainError, DomainResult, Money, ProductId, UserId};
    use bazaar_events::{HookError, PostCommitHook};
    use bazaar_inventory::{InMemoryInventoryLedger, Shortage, StockError};
    use bazaar_sales::{InMemoryOrderRepository, OrderStoreError};

    use super::*;

    type TestEngine = CheckoutEngine<
        Arc<InMemoryCartStore>,
        Arc<InMemoryInventoryLedger>,
        Arc<InMemoryOrderRepository>,
        Arc<InMemoryCatalog>,
    >;

    struct Fixture {
        engine: TestEngine,
        catalog: Arc<InMemoryCatalog>,
        ledger: Arc<InMemoryInventoryLedger>,
        orders: Arc<InMemoryOrderRepository>,
        carts: Arc<InMemoryCartStore>,
        vendor: Identity,
        store: bazaar_catalog::Store,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Arc::new(InMemoryCatalog::new());
            let ledger = Arc::new(InMemoryInventoryLedger::new());
            let orders = Arc::new(InMemoryOrderRepository::new());
            let carts = Arc::new(InMemoryCartStore::new());
            let vendor = Identity::new(UserId::new(), "vera", Role::Vendor);
            let store = catalog.open_store(&vendor, "Vera's", "").unwrap();
            let engine = CheckoutEngine::new(carts.clone(), ledger.clone(), orders.clone(), catalog.clone());

            Self {
                engine,
                catalog,
                ledger,
                orders,
                carts,
                vendor,
                store,
            }
        }

        fn product(&self, cents: u64, stock: u32) -> ProductId {
            let p = self
                .catalog
                .list_product(&self.vendor, self.store.id, "Widget", Money::from_cents(cents))
                .unwrap();
            self.ledger.restock(p.id, stock).unwrap();
            p.id
        }
    }

    fn test_buyer() -> Identity {
        Identity::new(UserId::new(), "bob", Role::Buyer).with_email("bob@example.test")
    }

    #[test]
    fn checkout_creates_order_decrements_stock_and_clears_cart() {
        let fx = Fixture::new();
        let p = fx.product(1000, 5);
        let session = SessionKey::new("s1");
        let buyer = test_buyer();
        fx.carts.add_item(&session, p, 2).unwrap();

        let order = fx.engine.checkout(&session, &buyer).unwrap();

        assert_eq!(order.buyer(), buyer.id);
        assert_eq!(order.items(), &[OrderItem::new(p, 2, Money::from_cents(1000))]);
        assert_eq!(order.total(), Money::from_cents(2000));
        assert_eq!(fx.ledger.get_stock(p).unwrap(), 3);
        assert!(fx.carts.get_items(&session).unwrap().is_empty());
        assert!(fx.orders.has_purchased(buyer.id, p).unwrap());
    }

    #[test]
    fn over_request_is_out_of_stock_and_changes_nothing() {
        let fx = Fixture::new();
        let p = fx.product(1000, 5);
        let session = SessionKey::new("s1");
        fx.carts.add_item(&session, p, 6).unwrap();

        let err = fx.engine.checkout(&session, &test_buyer()).unwrap_err();

        assert_eq!(
            err,
            CheckoutError::OutOfStock(vec![Shortage {
                product_id: p,
                requested: 6,
                available: 5
            }])
        );
        assert_eq!(fx.ledger.get_stock(p).unwrap(), 5);
        assert!(fx.orders.is_empty().unwrap());
        assert_eq!(fx.carts.get_items(&session).unwrap().quantity_of(p), 6);
    }

    #[test]
    fn partial_shortage_rolls_back_every_line_and_reports_all() {
        let fx = Fixture::new();
        let ok = fx.product(100, 10);
        let short_a = fx.product(100, 1);
        let short_b = fx.product(100, 0);
        let session = SessionKey::new("s1");
        fx.carts.add_item(&session, ok, 4).unwrap();
        fx.carts.add_item(&session, short_a, 2).unwrap();
        fx.carts.add_item(&session, short_b, 1).unwrap();

        let err = fx.engine.checkout(&session, &test_buyer()).unwrap_err();

        let mut reported: Vec<_> = err.shortages().iter().map(|s| s.product_id).collect();
        reported.sort();
        let mut expected = vec![short_a, short_b];
        expected.sort();
        assert_eq!(reported, expected);
        assert_eq!(fx.ledger.get_stock(ok).unwrap(), 10);
        assert_eq!(fx.ledger.get_stock(short_a).unwrap(), 1);
        assert!(fx.orders.is_empty().unwrap());
        assert_eq!(fx.carts.get_items(&session).unwrap().len(), 3);
    }

    #[test]
    fn empty_cart_is_rejected() {
        let fx = Fixture::new();
        let err = fx.engine.checkout(&SessionKey::new("nobody"), &test_buyer()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn unknown_product_is_not_found_and_stock_untouched() {
        let fx = Fixture::new();
        let p = fx.product(100, 3);
        let ghost = ProductId::new();
        let session = SessionKey::new("s1");
        fx.carts.add_item(&session, p, 1).unwrap();
        fx.carts.add_item(&session, ghost, 1).unwrap();

        let err = fx.engine.checkout(&session, &test_buyer()).unwrap_err();

        assert!(matches!(err, CheckoutError::NotFound { entity: "product", .. }));
        assert_eq!(fx.ledger.get_stock(p).unwrap(), 3);
    }

    #[test]
    fn price_is_snapshotted_at_checkout() {
        let fx = Fixture::new();
        let p = fx.product(1000, 5);
        let session = SessionKey::new("s1");
        let buyer = test_buyer();
        fx.carts.add_item(&session, p, 1).unwrap();

        let order = fx.engine.checkout(&session, &buyer).unwrap();
        fx.catalog.reprice(&fx.vendor, p, Money::from_cents(5000)).unwrap();

        let stored = fx.orders.get(order.id_typed()).unwrap();
        assert_eq!(stored.items()[0].unit_price_at_purchase, Money::from_cents(1000));
    }

    /// Ledger that holds its first batch caller right after the ledger
    /// answered, until the test lets it go.
    struct HoldingLedger {
        inner: Arc<InMemoryInventoryLedger>,
        held: AtomicBool,
        reached: Barrier,
        release: Barrier,
    }

    impl HoldingLedger {
        fn new(inner: Arc<InMemoryInventoryLedger>) -> Self {
            Self {
                inner,
                held: AtomicBool::new(false),
                reached: Barrier::new(2),
                release: Barrier::new(2),
            }
        }
    }

    impl InventoryLedger for HoldingLedger {
        fn get_stock(&self, product_id: ProductId) -> Result<u32, StockError> {
            self.inner.get_stock(product_id)
        }

        fn try_decrement(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
            self.inner.try_decrement(product_id, quantity)
        }

        fn try_decrement_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError> {
            let result = self.inner.try_decrement_all(lines);
            if !self.held.swap(true, Ordering::SeqCst) {
                self.reached.wait();
                self.release.wait();
            }
            result
        }

        fn restock(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
            self.inner.restock(product_id, quantity)
        }
    }

    #[test]
    fn failing_attempt_in_flight_does_not_hide_stock_from_another_buyer() {
        let fx = Fixture::new();
        let shared = fx.product(100, 1);
        let sold_out = fx.product(100, 0);
        let (first, second) = (SessionKey::new("first"), SessionKey::new("second"));
        fx.carts.add_item(&first, shared, 1).unwrap();
        fx.carts.add_item(&first, sold_out, 1).unwrap();
        fx.carts.add_item(&second, shared, 1).unwrap();
        let ledger = Arc::new(HoldingLedger::new(fx.ledger.clone()));
        let engine = CheckoutEngine::new(fx.carts.clone(), ledger.clone(), fx.orders.clone(), fx.catalog.clone());

        let (first_result, second_result) = thread::scope(|scope| {
            let held = scope.spawn(|| engine.checkout(&first, &test_buyer()));
            ledger.reached.wait();
            let second_result = engine.checkout(&second, &test_buyer());
            ledger.release.wait();
            (held.join().unwrap(), second_result)
        });

        assert_eq!(
            first_result.unwrap_err(),
            CheckoutError::OutOfStock(vec![Shortage {
                product_id: sold_out,
                requested: 1,
                available: 0
            }])
        );
        assert!(second_result.is_ok());
        assert_eq!(fx.ledger.get_stock(shared).unwrap(), 0);
        assert_eq!(fx.orders.len().unwrap(), 1);
        assert_eq!(fx.carts.get_items(&first).unwrap().len(), 2);
    }

    struct FailingOrders;

    impl OrderRepository for FailingOrders {
        fn save(&self, _order: &Order) -> Result<(), OrderStoreError> {
            Err(OrderStoreError::Unavailable("disk full".to_string()))
        }

        fn get(&self, id: bazaar_core::OrderId) -> Result<Order, OrderStoreError> {
            Err(OrderStoreError::NotFound(id))
        }

        fn has_purchased(&self, _user: UserId, _product: ProductId) -> Result<bool, OrderStoreError> {
            Ok(false)
        }

        fn orders_for(&self, _user: UserId) -> Result<Vec<Order>, OrderStoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_order_save_rolls_back_stock_and_keeps_cart() {
        let fx = Fixture::new();
        let p = fx.product(100, 5);
        let session = SessionKey::new("s1");
        fx.carts.add_item(&session, p, 2).unwrap();
        let engine = CheckoutEngine::new(fx.carts.clone(), fx.ledger.clone(), FailingOrders, fx.catalog.clone());

        let err = engine.checkout(&session, &test_buyer()).unwrap_err();

        assert!(matches!(err, CheckoutError::OrderStore(OrderStoreError::Unavailable(_))));
        assert_eq!(fx.ledger.get_stock(p).unwrap(), 5);
        assert_eq!(fx.carts.get_items(&session).unwrap().quantity_of(p), 2);
    }

    /// Cart store whose `clear` always fails.
    struct StickyCarts(InMemoryCartStore);

    impl CartStore for StickyCarts {
        fn add_item(&self, s: &SessionKey, p: ProductId, q: u32) -> DomainResult<Cart> {
            self.0.add_item(s, p, q)
        }

        fn update_quantity(&self, s: &SessionKey, p: ProductId, q: i64) -> DomainResult<Cart> {
            self.0.update_quantity(s, p, q)
        }

        fn remove_item(&self, s: &SessionKey, p: ProductId) -> DomainResult<Cart> {
            self.0.remove_item(s, p)
        }

        fn clear(&self, _s: &SessionKey) -> DomainResult<()> {
            Err(DomainError::unavailable("cart backend down"))
        }

        fn get_items(&self, s: &SessionKey) -> DomainResult<Cart> {
            self.0.get_items(s)
        }
    }

    #[test]
    fn cart_clear_failure_does_not_undo_order() {
        let fx = Fixture::new();
        let p = fx.product(100, 5);
        let session = SessionKey::new("s1");
        let carts = StickyCarts(InMemoryCartStore::new());
        carts.add_item(&session, p, 1).unwrap();
        let engine = CheckoutEngine::new(carts, fx.ledger.clone(), fx.orders.clone(), fx.catalog.clone());

        let order = engine.checkout(&session, &test_buyer()).unwrap();

        assert_eq!(fx.orders.get(order.id_typed()).unwrap(), order);
        assert_eq!(fx.ledger.get_stock(p).unwrap(), 4);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<OrderPlaced>>);

    impl PostCommitHook<OrderPlaced> for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn on_commit(&self, event: &OrderPlaced) -> Result<(), HookError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    impl PostCommitHook<OrderPlaced> for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn on_commit(&self, _event: &OrderPlaced) -> Result<(), HookError> {
            Err(HookError::new("smtp down"))
        }
    }

    #[test]
    fn hooks_see_order_and_their_failures_do_not_fail_checkout() {
        let fx = Fixture::new();
        let p = fx.product(100, 5);
        let recorder = Arc::new(Recorder::default());
        let engine = CheckoutEngine::new(fx.carts.clone(), fx.ledger.clone(), fx.orders.clone(), fx.catalog.clone())
            .with_hooks(HookRegistry::new().with(Arc::new(Broken)).with(recorder.clone()));
        let session = SessionKey::new("s1");
        let buyer = test_buyer();
        fx.carts.add_item(&session, p, 1).unwrap();

        let order = engine.checkout(&session, &buyer).unwrap();

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].order, order);
        assert_eq!(seen[0].buyer_username, "bob");
        assert_eq!(seen[0].buyer_email.as_deref(), Some("bob@example.test"));
    }

    #[test]
    fn failed_checkout_fires_no_hooks() {
        let fx = Fixture::new();
        let p = fx.product(100, 0);
        let recorder = Arc::new(Recorder::default());
        let engine = CheckoutEngine::new(fx.carts.clone(), fx.ledger.clone(), fx.orders.clone(), fx.catalog.clone())
            .with_hooks(HookRegistry::new().with(recorder.clone()));
        let session = SessionKey::new("s1");
        fx.carts.add_item(&session, p, 1).unwrap();

        assert!(engine.checkout(&session, &test_buyer()).is_err());
        assert!(recorder.0.lock().unwrap().is_empty());
    }
}
