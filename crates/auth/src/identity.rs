use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::Role;

/// Something owned by a single user (a vendor's store).
pub trait Owned {
    fn owner(&self) -> UserId;
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    /// True when this identity owns `thing`, whatever its role.
    pub fn owns(&self, thing: &impl Owned) -> bool {
        thing.owner() == self.id
    }

    /// True for a vendor acting on their own store.
    pub fn is_vendor_of(&self, store: &impl Owned) -> bool {
        self.is_vendor() && self.owns(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shop(UserId);

    impl Owned for Shop {
        fn owner(&self) -> UserId {
            self.0
        }
    }

    #[test]
    fn vendor_of_requires_role_and_ownership() {
        let vendor = Identity::new(UserId::new(), "vera", Role::Vendor);
        let own = Shop(vendor.id);
        let other = Shop(UserId::new());

        assert!(vendor.is_vendor_of(&own));
        assert!(!vendor.is_vendor_of(&other));
    }

    #[test]
    fn ownership_is_independent_of_role() {
        let buyer = Identity::new(UserId::new(), "bob", Role::Buyer);
        let shop = Shop(buyer.id);

        assert!(buyer.owns(&shop));
        assert!(!buyer.is_vendor_of(&shop));
    }
}
