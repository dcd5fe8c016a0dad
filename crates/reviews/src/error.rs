use thiserror::Error;

use bazaar_core::{DomainError, ProductId, UserId};
use bazaar_sales::OrderStoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewStoreError {
    #[error("review by {reviewer} for product {product_id} already exists")]
    Duplicate { reviewer: UserId, product_id: ProductId },

    #[error("review store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("vendors cannot review products of their own store")]
    VendorSelfReview,

    #[error("product already reviewed by this user")]
    AlreadyReviewed,

    #[error(transparent)]
    Store(ReviewStoreError),

    #[error(transparent)]
    Catalog(DomainError),

    #[error(transparent)]
    Orders(#[from] OrderStoreError),
}

impl From<ReviewStoreError> for ReviewError {
    fn from(value: ReviewStoreError) -> Self {
        match value {
            ReviewStoreError::Duplicate { .. } => ReviewError::AlreadyReviewed,
            other => ReviewError::Store(other),
        }
    }
}

impl From<DomainError> for ReviewError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound { entity, id } => ReviewError::NotFound { entity, id },
            other => ReviewError::Catalog(other),
        }
    }
}
