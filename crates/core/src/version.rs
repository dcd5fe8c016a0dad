//! Optimistic concurrency expectations.

use crate::error::{DomainError, DomainResult};

/// Version a writer expects a row to be at when it commits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedVersion(pub u64);

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        self.0 == actual
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {}, actual: {actual})",
                self.0
            )))
        }
    }
}
