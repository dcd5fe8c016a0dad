use bazaar_core::ProductId;

use crate::{InventoryLedger, StockError};

/// All-or-nothing scope over a stock reservation.
///
/// [`reserve`] takes every line in one ledger step, so other callers see
/// either none of it or all of it. Unless [`commit`] is called, dropping the
/// scope restocks what was reserved, so an early return or a panic between
/// reservation and commit never leaks stock.
///
/// [`reserve`]: StockTransaction::reserve
/// [`commit`]: StockTransaction::commit
#[must_use = "dropping a StockTransaction without commit rolls it back"]
pub struct StockTransaction<'a, L: InventoryLedger + ?Sized> {
    ledger: &'a L,
    applied: Vec<(ProductId, u32)>,
    committed: bool,
}

impl<'a, L: InventoryLedger + ?Sized> StockTransaction<'a, L> {
    pub fn begin(ledger: &'a L) -> Self {
        Self {
            ledger,
            applied: Vec::new(),
            committed: false,
        }
    }

    /// Take every line or none. On error nothing was reserved.
    pub fn reserve(&mut self, lines: &[(ProductId, u32)]) -> Result<(), StockError> {
        self.ledger.try_decrement_all(lines)?;
        self.applied.extend_from_slice(lines);
        Ok(())
    }

    /// Reservations applied so far, in order.
    pub fn applied(&self) -> &[(ProductId, u32)] {
        &self.applied
    }

    /// Keep every reservation.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Undo every reservation now.
    pub fn rollback(self) {}
}

impl<L: InventoryLedger + ?Sized> Drop for StockTransaction<'_, L> {
    fn drop(&mut self) {
        if self.committed || self.applied.is_empty() {
            return;
        }

        tracing::warn!(lines = self.applied.len(), "rolling back stock transaction");
        for (product_id, quantity) in self.applied.drain(..).rev() {
            if let Err(err) = self.ledger.restock(product_id, quantity) {
                tracing::error!(product_id = %product_id, quantity, error = %err, "stock rollback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryInventoryLedger;

    fn test_ledger(stocks: &[u32]) -> (InMemoryInventoryLedger, Vec<ProductId>) {
        let ledger = InMemoryInventoryLedger::new();
        let products = stocks
            .iter()
            .map(|&stock| {
                let p = ProductId::new();
                ledger.restock(p, stock).unwrap();
                p
            })
            .collect();
        (ledger, products)
    }

    #[test]
    fn failed_reserve_takes_nothing() {
        let (ledger, p) = test_ledger(&[5, 1]);

        let mut txn = StockTransaction::begin(&ledger);
        assert!(txn.reserve(&[(p[0], 3), (p[1], 2)]).is_err());
        assert!(txn.applied().is_empty());
        // Nothing was taken, not even temporarily.
        assert_eq!(ledger.get_stock(p[0]).unwrap(), 5);
        drop(txn);

        assert_eq!(ledger.get_stock(p[0]).unwrap(), 5);
        assert_eq!(ledger.get_stock(p[1]).unwrap(), 1);
    }

    #[test]
    fn drop_without_commit_restores_stock() {
        let (ledger, p) = test_ledger(&[5, 2]);

        {
            let mut txn = StockTransaction::begin(&ledger);
            txn.reserve(&[(p[0], 3), (p[1], 2)]).unwrap();
            assert_eq!(txn.applied(), &[(p[0], 3), (p[1], 2)]);
            assert_eq!(ledger.get_stock(p[1]).unwrap(), 0);
        }

        assert_eq!(ledger.get_stock(p[0]).unwrap(), 5);
        assert_eq!(ledger.get_stock(p[1]).unwrap(), 2);
    }

    #[test]
    fn commit_keeps_reservation() {
        let (ledger, p) = test_ledger(&[5]);

        let mut txn = StockTransaction::begin(&ledger);
        txn.reserve(&[(p[0], 2)]).unwrap();
        txn.commit();

        assert_eq!(ledger.get_stock(p[0]).unwrap(), 3);
    }

    #[test]
    fn explicit_rollback_restores_stock() {
        let (ledger, p) = test_ledger(&[4]);

        let mut txn = StockTransaction::begin(&ledger);
        txn.reserve(&[(p[0], 4)]).unwrap();
        txn.rollback();

        assert_eq!(ledger.get_stock(p[0]).unwrap(), 4);
    }
}
