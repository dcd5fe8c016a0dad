//! Outbound notifications, wired in as post-commit hooks.
//!
//! - invoice email to the buyer after an order commits
//! - public announcements of new products and reviews, behind toggles
//!
//! Delivery failures surface as `HookError`s, which the hook registry logs
//! and swallows.

pub mod announce;
pub mod error;
pub mod invoice;
pub mod mail;

pub use announce::{
    AnnouncementHook, AnnouncementService, AnnouncementSettings, LoggingAnnouncer, RecordingAnnouncer,
};
pub use error::NotifyError;
pub use invoice::{Invoice, InvoiceHook};
pub use mail::{EmailMessage, LogMailer, NotificationService, OutboxMailer};
