use std::sync::Arc;

use bazaar_core::{DomainResult, ProductId, StoreId};

use crate::{Product, Store};

/// Read side of the catalog consumed by the engines.
pub trait CatalogService: Send + Sync {
    fn product(&self, id: ProductId) -> DomainResult<Product>;

    fn store(&self, id: StoreId) -> DomainResult<Store>;

    /// Products of one store ordered by name, optionally filtered by a
    /// case-insensitive name fragment.
    fn products_in_store(&self, store: StoreId, query: Option<&str>) -> DomainResult<Vec<Product>>;

    /// The store that sells `product`.
    fn store_of(&self, product: ProductId) -> DomainResult<Store> {
        let product = self.product(product)?;
        self.store(product.store_id)
    }
}

impl<C> CatalogService for Arc<C>
where
    C: CatalogService + ?Sized,
{
    fn product(&self, id: ProductId) -> DomainResult<Product> {
        (**self).product(id)
    }

    fn store(&self, id: StoreId) -> DomainResult<Store> {
        (**self).store(id)
    }

    fn products_in_store(&self, store: StoreId, query: Option<&str>) -> DomainResult<Vec<Product>> {
        (**self).products_in_store(store, query)
    }

    fn store_of(&self, product: ProductId) -> DomainResult<Store> {
        (**self).store_of(product)
    }
}
