//! Monetary amounts in minor units.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Non-negative amount in the smallest currency unit (cents).
///
/// Single-currency by construction; there is no currency field.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).map(Self)
    }

    /// `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_two_decimal_places() {
        assert_eq!(Money::from_cents(1000).to_string(), "10.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn multiplication_overflow_is_reported() {
        assert_eq!(Money::from_cents(u64::MAX).checked_mul(2), None);
        assert_eq!(
            Money::from_cents(1000).checked_mul(2),
            Some(Money::from_cents(2000))
        );
    }

    proptest! {
        #[test]
        fn display_preserves_cents(cents in 0u64..10_000_000_000u64) {
            let rendered = Money::from_cents(cents).to_string();
            let (units, fraction) = rendered.split_once('.').unwrap();
            prop_assert_eq!(fraction.len(), 2);
            let back = units.parse::<u64>().unwrap() * 100 + fraction.parse::<u64>().unwrap();
            prop_assert_eq!(back, cents);
        }
    }
}
