//! Publish/subscribe mechanics for committed events.
//!
//! The bus is a distribution channel, not a store: orders and reviews are
//! already durable by the time their events are published, so delivery is
//! best-effort and consumers must tolerate duplicates.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

/// One consumer's view of the bus.
///
/// Every subscription receives its own copy of each published message, in
/// publication order. Meant to be drained by a single thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Transport-agnostic pub/sub with broadcast semantics.
///
/// `publish` may fail (closed transport, poisoned state); callers running
/// after a commit log the failure instead of surfacing it.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
