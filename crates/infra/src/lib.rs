//! Wiring layer: configuration and the in-process marketplace.

pub mod config;
pub mod marketplace;


pub use config::Settings;
pub use marketplace::{Marketplace, MarketplaceError};
