use serde::{Deserialize, Serialize};

use bazaar_auth::Owned;
use bazaar_core::{Entity, StoreId, UserId};

/// A vendor's storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub vendor: UserId,
    pub name: String,
    pub description: String,
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Owned for Store {
    fn owner(&self) -> UserId {
        self.vendor
    }
}
