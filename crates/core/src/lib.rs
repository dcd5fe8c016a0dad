//! `bazaar-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, money, the error taxonomy and version
//! expectations. No storage, no IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{OrderId, ProductId, ReviewId, StoreId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
