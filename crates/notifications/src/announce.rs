use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use bazaar_catalog::ProductListed;
use bazaar_events::{HookError, PostCommitHook};
use bazaar_reviews::ReviewSubmitted;

use crate::NotifyError;

/// Runtime toggles. A per-event toggle only counts when `enabled` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementSettings {
    pub enabled: bool,
    pub new_product: bool,
    pub new_review: bool,
}

impl AnnouncementSettings {
    pub fn announces_products(&self) -> bool {
        self.enabled && self.new_product
    }

    pub fn announces_reviews(&self) -> bool {
        self.enabled && self.new_review
    }
}

/// Public, fire-and-forget announcement channel (a social feed).
pub trait AnnouncementService: Send + Sync {
    fn announce(&self, text: &str) -> Result<(), NotifyError>;
}

impl<A> AnnouncementService for Arc<A>
where
    A: AnnouncementService + ?Sized,
{
    fn announce(&self, text: &str) -> Result<(), NotifyError> {
        (**self).announce(text)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAnnouncer;

impl AnnouncementService for LoggingAnnouncer {
    fn announce(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(text, "announcement");
        Ok(())
    }
}

/// Keeps announcements in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    posts: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Result<Vec<String>, NotifyError> {
        self.posts
            .lock()
            .map(|p| p.clone())
            .map_err(|_| NotifyError::Unavailable("announcer lock poisoned".to_string()))
    }
}

impl AnnouncementService for RecordingAnnouncer {
    fn announce(&self, text: &str) -> Result<(), NotifyError> {
        self.posts
            .lock()
            .map_err(|_| NotifyError::Unavailable("announcer lock poisoned".to_string()))?
            .push(text.to_string());
        Ok(())
    }
}

pub fn product_text(event: &ProductListed) -> String {
    format!(
        "New product: {} at {} - {}",
        event.product_name, event.store_name, event.price
    )
}

pub fn review_text(event: &ReviewSubmitted) -> String {
    format!(
        "New review for {}: {}/5 by {}",
        event.product_name, event.review.rating, event.reviewer_username
    )
}

/// Announces new products and reviews when the matching toggle is on.
pub struct AnnouncementHook<A> {
    announcer: A,
    settings: AnnouncementSettings,
}

impl<A> AnnouncementHook<A> {
    pub fn new(announcer: A, settings: AnnouncementSettings) -> Self {
        Self { announcer, settings }
    }
}

impl<A: AnnouncementService> AnnouncementHook<A> {
    fn post(&self, allowed: bool, kind: &'static str, text: String) -> Result<(), HookError> {
        if !allowed {
            tracing::debug!(kind, "announcement disabled");
            return Ok(());
        }
        self.announcer
            .announce(&text)
            .map_err(|e| HookError::new(e.to_string()))
    }
}

impl<A: AnnouncementService> PostCommitHook<ProductListed> for AnnouncementHook<A> {
    fn name(&self) -> &'static str {
        "announce-product"
    }

    fn on_commit(&self, event: &ProductListed) -> Result<(), HookError> {
        self.post(self.settings.announces_products(), "product", product_text(event))
    }
}

impl<A: AnnouncementService> PostCommitHook<ReviewSubmitted> for AnnouncementHook<A> {
    fn name(&self) -> &'static str {
        "announce-review"
    }

    fn on_commit(&self, event: &ReviewSubmitted) -> Result<(), HookError> {
        self.post(self.settings.announces_reviews(), "review", review_text(event))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use bazaar_core::{Money, ProductId, ReviewId, StoreId, UserId};
    use bazaar_reviews::{Rating, Review};

    use super::*;

    fn test_listing() -> ProductListed {
        ProductListed {
            product_id: ProductId::new(),
            store_id: StoreId::new(),
            product_name: "Mug".to_string(),
            store_name: "Vera's".to_string(),
            price: Money::from_cents(1250),
            occurred_at: Utc::now(),
        }
    }

    fn test_review_event() -> ReviewSubmitted {
        ReviewSubmitted {
            review: Review {
                id: ReviewId::new(),
                product_id: ProductId::new(),
                reviewer: UserId::new(),
                rating: Rating::new(4).unwrap(),
                comment: None,
                verified_purchase: true,
                created_at: Utc::now(),
            },
            product_name: "Mug".to_string(),
            reviewer_username: "alice".to_string(),
            occurred_at: Utc::now(),
        }
    }

    fn all_on() -> AnnouncementSettings {
        AnnouncementSettings {
            enabled: true,
            new_product: true,
            new_review: true,
        }
    }

    #[test]
    fn texts_match_expected_format() {
        assert_eq!(product_text(&test_listing()), "New product: Mug at Vera's - 12.50");
        assert_eq!(review_text(&test_review_event()), "New review for Mug: 4/5 by alice");
    }

    #[test]
    fn enabled_hook_posts_both_kinds() {
        let announcer = Arc::new(RecordingAnnouncer::new());
        let hook = AnnouncementHook::new(announcer.clone(), all_on());

        PostCommitHook::<ProductListed>::on_commit(&hook, &test_listing()).unwrap();
        PostCommitHook::<ReviewSubmitted>::on_commit(&hook, &test_review_event()).unwrap();

        assert_eq!(announcer.posts().unwrap().len(), 2);
    }

    #[test]
    fn global_toggle_overrides_per_event_toggles() {
        let announcer = Arc::new(RecordingAnnouncer::new());
        let settings = AnnouncementSettings {
            enabled: false,
            ..all_on()
        };
        let hook = AnnouncementHook::new(announcer.clone(), settings);

        PostCommitHook::<ProductListed>::on_commit(&hook, &test_listing()).unwrap();
        PostCommitHook::<ReviewSubmitted>::on_commit(&hook, &test_review_event()).unwrap();

        assert!(announcer.posts().unwrap().is_empty());
    }

    #[test]
    fn per_event_toggle_is_respected() {
        let announcer = Arc::new(RecordingAnnouncer::new());
        let settings = AnnouncementSettings {
            new_review: false,
            ..all_on()
        };
        let hook = AnnouncementHook::new(announcer.clone(), settings);

        PostCommitHook::<ProductListed>::on_commit(&hook, &test_listing()).unwrap();
        PostCommitHook::<ReviewSubmitted>::on_commit(&hook, &test_review_event()).unwrap();

        assert_eq!(announcer.posts().unwrap(), vec!["New product: Mug at Vera's - 12.50".to_string()]);
    }

    struct Down;

    impl AnnouncementService for Down {
        fn announce(&self, _text: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Unavailable("rate limited".to_string()))
        }
    }

    #[test]
    fn delivery_failure_becomes_hook_error() {
        let hook = AnnouncementHook::new(Down, all_on());
        let err = PostCommitHook::<ProductListed>::on_commit(&hook, &test_listing()).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
