use chrono::Utc;
use tracing::instrument;

use bazaar_auth::Identity;
use bazaar_catalog::CatalogService;
use bazaar_core::{ProductId, ReviewId};
use bazaar_events::HookRegistry;
use bazaar_sales::OrderRepository;

use crate::{Rating, Review, ReviewError, ReviewRepository, ReviewSubmitted};

/// Admits or rejects review submissions.
///
/// Checks run in a fixed order: rating range, product existence, store
/// ownership, then uniqueness. Uniqueness is finally decided by the
/// repository's atomic insert, so two racing submissions from the same
/// reviewer produce one review and one `AlreadyReviewed`.
pub struct ReviewEligibilityService<R, O, P> {
    reviews: R,
    orders: O,
    catalog: P,
    on_submitted: HookRegistry<ReviewSubmitted>,
}

impl<R, O, P> ReviewEligibilityService<R, O, P> {
    pub fn new(reviews: R, orders: O, catalog: P) -> Self {
        Self {
            reviews,
            orders,
            catalog,
            on_submitted: HookRegistry::new(),
        }
    }

    pub fn with_hooks(mut self, on_submitted: HookRegistry<ReviewSubmitted>) -> Self {
        self.on_submitted = on_submitted;
        self
    }
}

impl<R, O, P> ReviewEligibilityService<R, O, P>
where
    R: ReviewRepository,
    O: OrderRepository,
    P: CatalogService,
{
    #[instrument(skip(self, reviewer, text), fields(reviewer = %reviewer.id, product_id = %product_id))]
    pub fn submit_review(
        &self,
        reviewer: &Identity,
        product_id: ProductId,
        rating: i64,
        text: &str,
    ) -> Result<Review, ReviewError> {
        let rating = Rating::new(rating)?;

        let product = self.catalog.product(product_id)?;
        let store = self.catalog.store(product.store_id)?;

        // Unconditional: purchase history does not matter here.
        if reviewer.owns(&store) {
            tracing::info!(store_id = %store.id, "review rejected: vendor self-review");
            return Err(ReviewError::VendorSelfReview);
        }

        if self.reviews.exists(reviewer.id, product_id)? {
            return Err(ReviewError::AlreadyReviewed);
        }

        let verified_purchase = self.orders.has_purchased(reviewer.id, product_id)?;
        let review = Review {
            id: ReviewId::new(),
            product_id,
            reviewer: reviewer.id,
            rating,
            comment: normalize_comment(text),
            verified_purchase,
            created_at: Utc::now(),
        };
        self.reviews.insert(&review)?;

        tracing::info!(review_id = %review.id, rating = rating.get(), verified_purchase, "review submitted");

        self.on_submitted.fire(&ReviewSubmitted {
            review: review.clone(),
            product_name: product.name,
            reviewer_username: reviewer.username.clone(),
            occurred_at: review.created_at,
        });

        Ok(review)
    }

    /// Public listing, newest first.
    pub fn reviews_for(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewError> {
        self.catalog.product(product_id)?;
        Ok(self.reviews.list_for_product(product_id)?)
    }
}

fn normalize_comment(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
