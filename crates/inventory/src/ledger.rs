use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use bazaar_core::{ExpectedVersion, ProductId};

use crate::{Shortage, StockError};

/// Conflict retries before a contended decrement gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Authoritative stock count per product.
pub trait InventoryLedger: Send + Sync {
    fn get_stock(&self, product_id: ProductId) -> Result<u32, StockError>;

    /// Subtract `quantity` if and only if at least that much is in stock.
    /// Returns the remaining stock. On failure nothing changes.
    fn try_decrement(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError>;

    /// Subtract every line or none of them, as one step no other caller can
    /// observe halfway. A shortfall reports every short product.
    fn try_decrement_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError>;

    /// Add `quantity` units, creating the row if the product is new.
    /// Returns the new stock.
    fn restock(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError>;
}

impl<L> InventoryLedger for Arc<L>
where
    L: InventoryLedger + ?Sized,
{
    fn get_stock(&self, product_id: ProductId) -> Result<u32, StockError> {
        (**self).get_stock(product_id)
    }

    fn try_decrement(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
        (**self).try_decrement(product_id, quantity)
    }

    fn try_decrement_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError> {
        (**self).try_decrement_all(lines)
    }

    fn restock(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
        (**self).restock(product_id, quantity)
    }
}

#[derive(Debug, Clone, Copy)]
struct StockRow {
    quantity: u32,
    version: u64,
}

/// In-memory ledger with optimistic versioning.
///
/// A single-product decrement reads the row, decides, then commits only if
/// the row version is still the one it read. A conflicting writer forces a
/// re-read; after `max_attempts` conflicts it gives up with
/// [`StockError::Contended`]. Multi-product decrements check and apply every
/// row under one write lock instead.
#[derive(Debug)]
pub struct InMemoryInventoryLedger {
    rows: RwLock<HashMap<ProductId, StockRow>>,
    max_attempts: u32,
}

impl Default for InMemoryInventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn snapshot(&self, product_id: ProductId) -> Result<StockRow, StockError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StockError::Unavailable("ledger lock poisoned".to_string()))?;
        rows.get(&product_id).copied().ok_or(StockError::NotFound(product_id))
    }

    /// Write `quantity` if the row is still at `expected`. `Ok(false)` means
    /// another writer got there first.
    fn compare_and_set(
        &self,
        product_id: ProductId,
        expected: ExpectedVersion,
        quantity: u32,
    ) -> Result<bool, StockError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockError::Unavailable("ledger lock poisoned".to_string()))?;
        let row = rows.get_mut(&product_id).ok_or(StockError::NotFound(product_id))?;

        if expected.check(row.version).is_err() {
            return Ok(false);
        }
        row.quantity = quantity;
        row.version += 1;
        Ok(true)
    }

    /// Read-decide-commit loop. `between` runs after each read and before
    /// the commit that depends on it.
    fn decrement_with(
        &self,
        product_id: ProductId,
        quantity: u32,
        mut between: impl FnMut(),
    ) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity("quantity must be at least 1".to_string()));
        }

        for attempt in 1..=self.max_attempts {
            let row = self.snapshot(product_id)?;
            if row.quantity < quantity {
                return Err(StockError::OutOfStock(vec![Shortage {
                    product_id,
                    requested: quantity,
                    available: row.quantity,
                }]));
            }

            between();

            let remaining = row.quantity - quantity;
            if self.compare_and_set(product_id, ExpectedVersion(row.version), remaining)? {
                tracing::debug!(product_id = %product_id, quantity, remaining, "stock decremented");
                return Ok(remaining);
            }
            tracing::debug!(product_id = %product_id, attempt, "stock version conflict, retrying");
        }

        tracing::warn!(
            product_id = %product_id,
            requested = quantity,
            attempts = self.max_attempts,
            "stock decrement gave up after repeated conflicts"
        );
        Err(StockError::Contended {
            product_id,
            attempts: self.max_attempts,
        })
    }
}

impl InventoryLedger for InMemoryInventoryLedger {
    fn get_stock(&self, product_id: ProductId) -> Result<u32, StockError> {
        self.snapshot(product_id).map(|row| row.quantity)
    }

    fn try_decrement(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
        self.decrement_with(product_id, quantity, || {})
    }

    fn try_decrement_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError> {
        let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
        for &(product_id, quantity) in lines {
            if quantity == 0 {
                return Err(StockError::InvalidQuantity("quantity must be at least 1".to_string()));
            }
            let total = wanted.entry(product_id).or_insert(0);
            *total = total
                .checked_add(quantity)
                .ok_or_else(|| StockError::InvalidQuantity("quantity overflow".to_string()))?;
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockError::Unavailable("ledger lock poisoned".to_string()))?;

        let mut shortages = Vec::new();
        for (&product_id, &requested) in &wanted {
            let row = rows.get(&product_id).ok_or(StockError::NotFound(product_id))?;
            if row.quantity < requested {
                shortages.push(Shortage {
                    product_id,
                    requested,
                    available: row.quantity,
                });
            }
        }
        if !shortages.is_empty() {
            return Err(StockError::OutOfStock(shortages));
        }

        for (product_id, requested) in wanted {
            if let Some(row) = rows.get_mut(&product_id) {
                row.quantity -= requested;
                row.version += 1;
            }
        }
        tracing::debug!(lines = lines.len(), "stock decremented for every line");
        Ok(())
    }

    fn restock(&self, product_id: ProductId, quantity: u32) -> Result<u32, StockError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockError::Unavailable("ledger lock poisoned".to_string()))?;
        let row = rows.entry(product_id).or_insert(StockRow { quantity: 0, version: 0 });

        row.quantity = row
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| StockError::InvalidQuantity("stock overflow".to_string()))?;
        row.version += 1;
        Ok(row.quantity)
    }
}
