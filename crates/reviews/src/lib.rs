//! Product reviews and the rules deciding who may write one.
//!
//! A review is admitted once per (reviewer, product), never from the owner
//! of the product's store, and is flagged as a verified purchase when the
//! reviewer has a committed order containing the product.

pub mod error;
pub mod repository;
pub mod review;
pub mod service;

pub use error::{ReviewError, ReviewStoreError};
pub use repository::{InMemoryReviewRepository, ReviewRepository};
pub use review::{Rating, Review, ReviewSubmitted};
pub use service::ReviewEligibilityService;
