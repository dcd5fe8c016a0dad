use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::ProductId;

/// One product that could not cover a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub product_id: ProductId,
    pub requested: u32,
    pub available: u32,
}

impl core::fmt::Display for Shortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "product {} (requested {}, available {})",
            self.product_id, self.requested, self.available
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Every product that could not be covered, never empty.
    #[error("out of stock: {}", render_shortages(.0))]
    OutOfStock(Vec<Shortage>),

    /// Concurrent writers kept winning; stock may well be sufficient.
    #[error("stock for product {product_id} contended after {attempts} attempts")]
    Contended { product_id: ProductId, attempts: u32 },

    #[error("no stock record for product {0}")]
    NotFound(ProductId),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

fn render_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
