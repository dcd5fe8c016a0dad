//! Cart to order conversion.

pub mod engine;
pub mod error;
pub mod state;

pub use engine::CheckoutEngine;
pub use error::CheckoutError;
pub use state::CheckoutState;
