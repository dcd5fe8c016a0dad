//! Process-wide logging setup for bazaar binaries and test harnesses.

/// Subscriber installation (filters, JSON formatting).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, init_with};

/// Install the JSON subscriber with the default filter.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() -> bool {
    crate::tracing::init_with(DEFAULT_FILTER)
}
