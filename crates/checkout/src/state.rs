use core::fmt;

/// Lifecycle of one checkout attempt.
///
/// ```text
/// Pending -> Validating -> Committing -> Completed
///    |           |             |
///    +-----------+-------------+------> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Pending,
    Validating,
    Committing,
    Completed,
    Failed,
}

impl CheckoutState {
    pub fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;

        matches!(
            (self, next),
            (Pending, Validating)
                | (Validating, Committing)
                | (Committing, Completed)
                | (Pending | Validating | Committing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CheckoutState::Completed | CheckoutState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutState::Pending => "pending",
            CheckoutState::Validating => "validating",
            CheckoutState::Committing => "committing",
            CheckoutState::Completed => "completed",
            CheckoutState::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the state of a single attempt and logs every move.
#[derive(Debug)]
pub(crate) struct Attempt {
    state: CheckoutState,
}

impl Attempt {
    pub(crate) fn start() -> Self {
        Self {
            state: CheckoutState::Pending,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> CheckoutState {
        self.state
    }

    pub(crate) fn enter(&mut self, next: CheckoutState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal checkout transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "checkout state");
        self.state = next;
    }

    /// Move to `Failed` and hand back `err`, for use in `map_err`.
    pub(crate) fn fail<E>(&mut self, err: E) -> E {
        if !self.state.is_terminal() {
            self.enter(CheckoutState::Failed);
        }
        err
    }
}
