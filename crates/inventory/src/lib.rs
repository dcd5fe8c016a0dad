//! Stock ledger.
//!
//! `try_decrement` and `try_decrement_all` are the only paths that reduce
//! stock. Both are atomic check-and-subtract steps, safe under any number of
//! concurrent callers; the batch form takes every line or none under one
//! lock. Checkout reservations go through [`StockTransaction`], which
//! restores what it reserved unless committed.

pub mod error;
pub mod ledger;
pub mod transaction;

pub use error::{Shortage, StockError};
pub use ledger::{DEFAULT_MAX_ATTEMPTS, InMemoryInventoryLedger, InventoryLedger};
pub use transaction::StockTransaction;
