use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A committed fact emitted by a component.
///
/// Events are immutable and versioned so envelopes published to external
/// consumers can evolve.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "sales.order.placed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Id of the entity the event is about (order, review, product).
    fn subject_id(&self) -> Uuid;

    /// Kind of entity the event is about (e.g. "order").
    fn subject_type(&self) -> &'static str;
}
