//! Committed orders.
//!
//! Orders are immutable once saved: they snapshot the unit price of every
//! line at purchase time, so later catalog price changes never alter them.

pub mod order;
pub mod repository;

pub use order::{Order, OrderItem, OrderPlaced, OrderStatus};
pub use repository::{InMemoryOrderRepository, OrderRepository, OrderStoreError};
