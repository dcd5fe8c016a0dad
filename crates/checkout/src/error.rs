use thiserror::Error;

use bazaar_core::DomainError;
use bazaar_inventory::{Shortage, StockError};
use bazaar_sales::OrderStoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// Every line that could not be covered, not just the first.
    #[error("out of stock: {}", render_shortages(.0))]
    OutOfStock(Vec<Shortage>),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Stock(StockError),

    #[error(transparent)]
    OrderStore(#[from] OrderStoreError),
}

impl CheckoutError {
    pub fn shortages(&self) -> &[Shortage] {
        match self {
            CheckoutError::OutOfStock(shortages) => shortages,
            _ => &[],
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound { entity, id } => CheckoutError::NotFound { entity, id },
            other => CheckoutError::Domain(other),
        }
    }
}

impl From<StockError> for CheckoutError {
    fn from(value: StockError) -> Self {
        match value {
            StockError::OutOfStock(shortages) => CheckoutError::OutOfStock(shortages),
            StockError::NotFound(product_id) => CheckoutError::NotFound {
                entity: "stock",
                id: product_id.to_string(),
            },
            other => CheckoutError::Stock(other),
        }
    }
}

fn render_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
