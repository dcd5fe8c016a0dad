use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use bazaar_auth::Identity;
use bazaar_core::{DomainError, DomainResult, Money, ProductId, StoreId};
use bazaar_events::HookRegistry;

use crate::{CatalogService, Product, ProductListed, Store};

#[derive(Debug, Default)]
struct Tables {
    stores: HashMap<StoreId, Store>,
    products: HashMap<ProductId, Product>,
}

/// Process-local catalog. Fires `ProductListed` hooks after a listing is
/// stored.
pub struct InMemoryCatalog {
    tables: RwLock<Tables>,
    on_listed: HookRegistry<ProductListed>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::with_hooks(HookRegistry::new())
    }

    pub fn with_hooks(on_listed: HookRegistry<ProductListed>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            on_listed,
        }
    }

    /// Open a store owned by `vendor`. Only vendors may own stores.
    pub fn open_store(
        &self,
        vendor: &Identity,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Store> {
        if !vendor.is_vendor() {
            return Err(DomainError::forbidden("only vendors can open a store"));
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("store name cannot be empty"));
        }

        let store = Store {
            id: StoreId::new(),
            vendor: vendor.id,
            name,
            description: description.into(),
        };

        let mut tables = self.write()?;
        tables.stores.insert(store.id, store.clone());
        tracing::debug!(store_id = %store.id, vendor = %vendor.id, "store opened");
        Ok(store)
    }

    /// List a product in one of the caller's stores.
    pub fn list_product(
        &self,
        vendor: &Identity,
        store_id: StoreId,
        name: impl Into<String>,
        price: Money,
    ) -> DomainResult<Product> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        let (product, event) = {
            let mut tables = self.write()?;
            let store = tables
                .stores
                .get(&store_id)
                .ok_or_else(|| DomainError::not_found("store", store_id))?;
            if !vendor.is_vendor_of(store) {
                return Err(DomainError::forbidden("store belongs to another vendor"));
            }
            let store_name = store.name.clone();

            let product = Product {
                id: ProductId::new(),
                store_id,
                name,
                price,
            };
            tables.products.insert(product.id, product.clone());

            let event = ProductListed {
                product_id: product.id,
                store_id,
                product_name: product.name.clone(),
                store_name,
                price,
                occurred_at: Utc::now(),
            };
            (product, event)
        };

        tracing::info!(product_id = %product.id, store_id = %store_id, price = %price, "product listed");
        self.on_listed.fire(&event);
        Ok(product)
    }

    /// Change the live price. Orders already placed keep their snapshot.
    pub fn reprice(&self, vendor: &Identity, product_id: ProductId, price: Money) -> DomainResult<Product> {
        let mut tables = self.write()?;
        let store_id = tables
            .products
            .get(&product_id)
            .map(|p| p.store_id)
            .ok_or_else(|| DomainError::not_found("product", product_id))?;
        let owned = tables
            .stores
            .get(&store_id)
            .is_some_and(|store| vendor.is_vendor_of(store));
        if !owned {
            return Err(DomainError::forbidden("product belongs to another vendor"));
        }

        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found("product", product_id))?;
        product.price = price;
        Ok(product.clone())
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| DomainError::unavailable("catalog lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| DomainError::unavailable("catalog lock poisoned"))
    }
}

impl CatalogService for InMemoryCatalog {
    fn product(&self, id: ProductId) -> DomainResult<Product> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    fn store(&self, id: StoreId) -> DomainResult<Store> {
        self.read()?
            .stores
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("store", id))
    }

    fn products_in_store(&self, store: StoreId, query: Option<&str>) -> DomainResult<Vec<Product>> {
        let tables = self.read()?;
        if !tables.stores.contains_key(&store) {
            return Err(DomainError::not_found("store", store));
        }

        let needle = query.map(str::to_lowercase).filter(|q| !q.trim().is_empty());
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.store_id == store)
            .filter(|p| match &needle {
                Some(q) => p.name.to_lowercase().contains(q.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}
