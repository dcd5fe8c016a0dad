use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{Entity, Money, ProductId, StoreId};
use bazaar_events::Event;

/// A sellable product. `price` is the live price; orders snapshot it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    pub price: Money,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Event: a vendor listed a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListed {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub product_name: String,
    pub store_name: String,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl Event for ProductListed {
    fn event_type(&self) -> &'static str {
        "catalog.product.listed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn subject_id(&self) -> Uuid {
        *self.product_id.as_uuid()
    }

    fn subject_type(&self) -> &'static str {
        "product"
    }
}
