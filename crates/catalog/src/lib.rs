//! Catalog collaborator: stores, products and their prices.
//!
//! The checkout and review engines only read from the catalog (price,
//! owning store, store owner). Registration lives here so the engines can be
//! exercised end to end; stock is owned by `bazaar-inventory`.

pub mod in_memory;
pub mod product;
pub mod service;
pub mod store;

pub use in_memory::InMemoryCatalog;
pub use product::{Product, ProductListed};
pub use service::CatalogService;
pub use store::Store;
