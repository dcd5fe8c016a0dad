//! Per-session shopping carts.

pub mod cart;
pub mod store;

pub use cart::{Cart, CartItem, SessionKey};
pub use store::{CartStore, InMemoryCartStore};
