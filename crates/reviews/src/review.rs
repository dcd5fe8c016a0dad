use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{Entity, ProductId, ReviewId, UserId, ValueObject};
use bazaar_events::Event;

use crate::ReviewError;

/// Star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ReviewError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ReviewError::InvalidRating(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl ValueObject for Rating {}

impl TryFrom<i64> for Rating {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl core::fmt::Display for Rating {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored review. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub reviewer: UserId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Event: a review was admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmitted {
    pub review: Review,
    pub product_name: String,
    pub reviewer_username: String,
    pub occurred_at: DateTime<Utc>,
}

impl Event for ReviewSubmitted {
    fn event_type(&self) -> &'static str {
        "reviews.review.submitted"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn subject_id(&self) -> Uuid {
        *self.review.id.as_uuid()
    }

    fn subject_type(&self) -> &'static str {
        "review"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(Rating::new(1).unwrap().get(), 1);
        assert_eq!(Rating::new(5).unwrap().get(), 5);
        assert_eq!(Rating::new(0), Err(ReviewError::InvalidRating(0)));
        assert_eq!(Rating::new(6), Err(ReviewError::InvalidRating(6)));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn accepts_exactly_one_to_five(value in -1000i64..1000) {
            let accepted = Rating::new(value).is_ok();
            prop_assert_eq!(accepted, (1..=5).contains(&value));
        }
    }
}
