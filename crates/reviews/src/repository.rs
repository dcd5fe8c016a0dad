use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bazaar_core::{ProductId, UserId};

use crate::{Review, ReviewStoreError};

/// Review storage, unique on (reviewer, product).
pub trait ReviewRepository: Send + Sync {
    /// Insert unless the reviewer already reviewed the product. The check
    /// and the insert are one atomic step.
    fn insert(&self, review: &Review) -> Result<(), ReviewStoreError>;

    fn exists(&self, reviewer: UserId, product_id: ProductId) -> Result<bool, ReviewStoreError>;

    /// Reviews of one product, newest first.
    fn list_for_product(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewStoreError>;
}

impl<R> ReviewRepository for Arc<R>
where
    R: ReviewRepository + ?Sized,
{
    fn insert(&self, review: &Review) -> Result<(), ReviewStoreError> {
        (**self).insert(review)
    }

    fn exists(&self, reviewer: UserId, product_id: ProductId) -> Result<bool, ReviewStoreError> {
        (**self).exists(reviewer, product_id)
    }

    fn list_for_product(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewStoreError> {
        (**self).list_for_product(product_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReviewRepository {
    reviews: RwLock<HashMap<(UserId, ProductId), Review>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> ReviewStoreError {
        ReviewStoreError::Unavailable("review store lock poisoned".to_string())
    }
}

impl ReviewRepository for InMemoryReviewRepository {
    fn insert(&self, review: &Review) -> Result<(), ReviewStoreError> {
        let mut reviews = self.reviews.write().map_err(|_| Self::poisoned())?;
        let key = (review.reviewer, review.product_id);
        if reviews.contains_key(&key) {
            return Err(ReviewStoreError::Duplicate {
                reviewer: review.reviewer,
                product_id: review.product_id,
            });
        }
        reviews.insert(key, review.clone());
        Ok(())
    }

    fn exists(&self, reviewer: UserId, product_id: ProductId) -> Result<bool, ReviewStoreError> {
        let reviews = self.reviews.read().map_err(|_| Self::poisoned())?;
        Ok(reviews.contains_key(&(reviewer, product_id)))
    }

    fn list_for_product(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewStoreError> {
        let reviews = self.reviews.read().map_err(|_| Self::poisoned())?;
        let mut found: Vec<Review> = reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        // Review ids are v7 UUIDs, so they break timestamp ties in creation order.
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found)
    }
}
