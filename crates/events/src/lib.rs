//! Domain events and post-commit side-effect dispatch.
//!
//! Components announce what they committed by handing an event to a
//! [`HookRegistry`]. Hooks (invoice email, announcements, bus publication)
//! run after the transaction boundary and can never fail the operation
//! that produced the event.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod hooks;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use hooks::{BusPublisher, HookError, HookRegistry, PostCommitHook};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
