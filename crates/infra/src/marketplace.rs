//! In-process marketplace: every component wired together from [`Settings`].
//!
//! This is the surface a presentation layer (web handlers, a CLI) would sit
//! on. Every call takes the caller's session token; the cart of a session is
//! keyed by that token.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use bazaar_auth::{AuthError, Identity, IdentityProvider, InMemoryIdentityProvider, SessionToken};
use bazaar_cart::{Cart, CartStore, InMemoryCartStore, SessionKey};
use bazaar_catalog::{CatalogService, InMemoryCatalog, Product, ProductListed, Store};
use bazaar_checkout::{CheckoutEngine, CheckoutError};
use bazaar_core::{DomainError, Money, ProductId, StoreId};
use bazaar_events::{BusPublisher, EventEnvelope, HookRegistry, InMemoryEventBus};
use bazaar_inventory::{InMemoryInventoryLedger, InventoryLedger, StockError};
use bazaar_notifications::{
    AnnouncementHook, AnnouncementService, InvoiceHook, LogMailer, LoggingAnnouncer, NotificationService,
};
use bazaar_reviews::{InMemoryReviewRepository, Review, ReviewEligibilityService, ReviewError, ReviewSubmitted};
use bazaar_sales::{InMemoryOrderRepository, Order, OrderPlaced, OrderRepository, OrderStoreError};

use crate::Settings;

pub type EnvelopeBus = InMemoryEventBus<EventEnvelope<JsonValue>>;

type Checkout = CheckoutEngine<
    Arc<InMemoryCartStore>,
    Arc<InMemoryInventoryLedger>,
    Arc<InMemoryOrderRepository>,
    Arc<InMemoryCatalog>,
>;

type Reviews = ReviewEligibilityService<Arc<InMemoryReviewRepository>, Arc<InMemoryOrderRepository>, Arc<InMemoryCatalog>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Orders(#[from] OrderStoreError),
}

pub struct Marketplace {
    settings: Settings,
    identities: Arc<InMemoryIdentityProvider>,
    catalog: Arc<InMemoryCatalog>,
    carts: Arc<InMemoryCartStore>,
    ledger: Arc<InMemoryInventoryLedger>,
    orders: Arc<InMemoryOrderRepository>,
    bus: Arc<EnvelopeBus>,
    checkout: Checkout,
    reviews: Reviews,
}

impl Marketplace {
    /// Marketplace that logs emails and announcements instead of sending them.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, Arc::new(LogMailer), Arc::new(LoggingAnnouncer))
    }

    pub fn new(
        settings: Settings,
        mailer: Arc<dyn NotificationService>,
        announcer: Arc<dyn AnnouncementService>,
    ) -> Self {
        let bus: Arc<EnvelopeBus> = Arc::new(InMemoryEventBus::new());
        let announce = Arc::new(AnnouncementHook::new(announcer, settings.announcements));

        let catalog = Arc::new(InMemoryCatalog::with_hooks(
            HookRegistry::<ProductListed>::new()
                .with(announce.clone())
                .with(Arc::new(BusPublisher::new(bus.clone()))),
        ));
        let carts = Arc::new(InMemoryCartStore::new());
        let ledger = Arc::new(InMemoryInventoryLedger::with_max_attempts(settings.stock_retry_attempts));
        let orders = Arc::new(InMemoryOrderRepository::new());
        let review_store = Arc::new(InMemoryReviewRepository::new());

        let checkout = CheckoutEngine::new(carts.clone(), ledger.clone(), orders.clone(), catalog.clone()).with_hooks(
            HookRegistry::<OrderPlaced>::new()
                .with(Arc::new(InvoiceHook::new(
                    mailer,
                    catalog.clone(),
                    settings.invoice_from.clone(),
                )))
                .with(Arc::new(BusPublisher::new(bus.clone()))),
        );

        let reviews = ReviewEligibilityService::new(review_store, orders.clone(), catalog.clone()).with_hooks(
            HookRegistry::<ReviewSubmitted>::new()
                .with(announce)
                .with(Arc::new(BusPublisher::new(bus.clone()))),
        );

        tracing::info!(
            stock_retry_attempts = settings.stock_retry_attempts,
            announcements = settings.announcements.enabled,
            "marketplace ready"
        );

        Self {
            settings,
            identities: Arc::new(InMemoryIdentityProvider::new()),
            catalog,
            carts,
            ledger,
            orders,
            bus,
            checkout,
            reviews,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<InMemoryInventoryLedger> {
        &self.ledger
    }

    /// Bus carrying every committed event as a JSON envelope.
    pub fn bus(&self) -> &Arc<EnvelopeBus> {
        &self.bus
    }

    /// Start a session for an already-authenticated user.
    pub fn login(&self, identity: Identity) -> Result<SessionToken, MarketplaceError> {
        let ttl = chrono::Duration::hours(i64::from(self.settings.session_ttl_hours));
        Ok(self.identities.login(identity, ttl)?)
    }

    /// End the session. The session's cart is discarded with it.
    pub fn logout(&self, token: &SessionToken) -> Result<(), MarketplaceError> {
        self.carts.clear(&cart_key(token))?;
        Ok(self.identities.logout(token)?)
    }

    pub fn whoami(&self, token: &SessionToken) -> Result<Identity, MarketplaceError> {
        Ok(self.identities.resolve(token)?)
    }

    pub fn open_store(&self, token: &SessionToken, name: &str, description: &str) -> Result<Store, MarketplaceError> {
        let vendor = self.whoami(token)?;
        Ok(self.catalog.open_store(&vendor, name, description)?)
    }

    /// List a product and put its opening stock on the ledger.
    pub fn list_product(
        &self,
        token: &SessionToken,
        store_id: StoreId,
        name: &str,
        price: Money,
        opening_stock: u32,
    ) -> Result<Product, MarketplaceError> {
        let vendor = self.whoami(token)?;
        let product = self.catalog.list_product(&vendor, store_id, name, price)?;
        self.ledger.restock(product.id, opening_stock)?;
        Ok(product)
    }

    /// Public store listing, optionally narrowed by a name fragment.
    pub fn products_in_store(&self, store_id: StoreId, query: Option<&str>) -> Result<Vec<Product>, MarketplaceError> {
        Ok(self.catalog.products_in_store(store_id, query)?)
    }

    /// Add to the session's cart. Only listed products can be added.
    pub fn add_to_cart(&self, token: &SessionToken, product_id: ProductId, quantity: u32) -> Result<Cart, MarketplaceError> {
        self.whoami(token)?;
        self.catalog.product(product_id).map_err(|err| match err {
            DomainError::NotFound { .. } => DomainError::validation(format!("invalid product {product_id}")),
            other => other,
        })?;
        Ok(self.carts.add_item(&cart_key(token), product_id, quantity)?)
    }

    pub fn update_cart(&self, token: &SessionToken, product_id: ProductId, quantity: i64) -> Result<Cart, MarketplaceError> {
        self.whoami(token)?;
        Ok(self.carts.update_quantity(&cart_key(token), product_id, quantity)?)
    }

    pub fn remove_from_cart(&self, token: &SessionToken, product_id: ProductId) -> Result<Cart, MarketplaceError> {
        self.whoami(token)?;
        Ok(self.carts.remove_item(&cart_key(token), product_id)?)
    }

    pub fn clear_cart(&self, token: &SessionToken) -> Result<(), MarketplaceError> {
        self.whoami(token)?;
        Ok(self.carts.clear(&cart_key(token))?)
    }

    pub fn view_cart(&self, token: &SessionToken) -> Result<Cart, MarketplaceError> {
        self.whoami(token)?;
        Ok(self.carts.get_items(&cart_key(token))?)
    }

    pub fn place_order(&self, token: &SessionToken) -> Result<Order, MarketplaceError> {
        let buyer = self.whoami(token)?;
        Ok(self.checkout.checkout(&cart_key(token), &buyer)?)
    }

    pub fn submit_review(
        &self,
        token: &SessionToken,
        product_id: ProductId,
        rating: i64,
        text: &str,
    ) -> Result<Review, MarketplaceError> {
        let reviewer = self.whoami(token)?;
        Ok(self.reviews.submit_review(&reviewer, product_id, rating, text)?)
    }

    /// Public read; no session needed.
    pub fn reviews_for(&self, product_id: ProductId) -> Result<Vec<Review>, MarketplaceError> {
        Ok(self.reviews.reviews_for(product_id)?)
    }

    pub fn orders_for(&self, token: &SessionToken) -> Result<Vec<Order>, MarketplaceError> {
        let buyer = self.whoami(token)?;
        Ok(self.orders.orders_for(buyer.id)?)
    }

    pub fn stock_of(&self, product_id: ProductId) -> Result<u32, MarketplaceError> {
        Ok(self.ledger.get_stock(product_id)?)
    }
}

fn cart_key(token: &SessionToken) -> SessionKey {
    SessionKey::new(token.as_str())
}
