//! Post-commit hooks.
//!
//! A component that commits something (an order, a review, a product
//! listing) fires the matching event through its [`HookRegistry`] once the
//! commit is final. Each hook is its own failure domain: errors and panics
//! are logged and swallowed, and the remaining hooks still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::{Event, EventBus, EventEnvelope};

/// Failure reported by a hook. Only ever logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Side effect run after a successful commit.
pub trait PostCommitHook<E>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn on_commit(&self, event: &E) -> Result<(), HookError>;
}

/// Ordered list of hooks for one event type.
pub struct HookRegistry<E> {
    hooks: Vec<Arc<dyn PostCommitHook<E>>>,
}

impl<E> HookRegistry<E> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: Arc<dyn PostCommitHook<E>>) {
        self.hooks.push(hook);
    }

    pub fn with(mut self, hook: Arc<dyn PostCommitHook<E>>) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<E: Event> HookRegistry<E> {
    /// Run every hook in registration order and return how many failed.
    pub fn fire(&self, event: &E) -> usize {
        let mut failures = 0;

        for hook in &self.hooks {
            match catch_unwind(AssertUnwindSafe(|| hook.on_commit(event))) {
                Ok(Ok(())) => {
                    tracing::debug!(hook = hook.name(), event_type = event.event_type(), "post-commit hook ran");
                }
                Ok(Err(err)) => {
                    failures += 1;
                    tracing::warn!(
                        hook = hook.name(),
                        event_type = event.event_type(),
                        subject_id = %event.subject_id(),
                        error = %err,
                        "post-commit hook failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    tracing::error!(
                        hook = hook.name(),
                        event_type = event.event_type(),
                        subject_id = %event.subject_id(),
                        "post-commit hook panicked"
                    );
                }
            }
        }

        failures
    }
}

impl<E> Default for HookRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for HookRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<E> core::fmt::Debug for HookRegistry<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

/// Hook that forwards committed events to an [`EventBus`] as JSON envelopes.
#[derive(Debug)]
pub struct BusPublisher<B> {
    bus: B,
}

impl<B> BusPublisher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<E, B> PostCommitHook<E> for BusPublisher<B>
where
    E: Event + Serialize,
    B: EventBus<EventEnvelope<serde_json::Value>>,
{
    fn name(&self) -> &'static str {
        "bus_publisher"
    }

    fn on_commit(&self, event: &E) -> Result<(), HookError> {
        let envelope = EventEnvelope::from_typed(event)
            .map_err(|e| HookError::new(format!("payload serialization failed: {e}")))?;

        self.bus
            .publish(envelope)
            .map_err(|e| HookError::new(format!("publish failed: {e:?}")))
    }
}
