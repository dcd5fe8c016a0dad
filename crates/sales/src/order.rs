use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{DomainError, DomainResult, Entity, Money, OrderId, ProductId, UserId};
use bazaar_events::Event;

/// Order status. Orders are created already paid; payment itself happens
/// outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
}

/// Order line with the unit price frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_at_purchase: Money,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price_at_purchase: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price_at_purchase,
        }
    }

    pub fn line_total(&self) -> Money {
        Money::from_cents(
            self.unit_price_at_purchase
                .cents()
                .saturating_mul(u64::from(self.quantity)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    buyer: UserId,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total: Money,
}

impl Order {
    /// Build a new paid order. Requires at least one line, positive
    /// quantities and a total that fits in `Money`.
    pub fn place(buyer: UserId, items: Vec<OrderItem>, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let mut total = Money::ZERO;
        for item in &items {
            if item.quantity == 0 {
                return Err(DomainError::validation("order quantity must be at least 1"));
            }
            let line = item
                .unit_price_at_purchase
                .checked_mul(item.quantity)
                .ok_or_else(|| DomainError::validation("order line total overflow"))?;
            total = total
                .checked_add(line)
                .ok_or_else(|| DomainError::validation("order total overflow"))?;
        }

        Ok(Self {
            id: OrderId::new(),
            buyer,
            created_at,
            status: OrderStatus::Paid,
            items,
            total,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn buyer(&self) -> UserId {
        self.buyer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Event: an order was committed. Carries the buyer's contact details so
/// hooks (invoicing) need no further lookups for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order: Order,
    pub buyer_username: String,
    pub buyer_email: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Event for OrderPlaced {
    fn event_type(&self) -> &'static str {
        "sales.order.placed"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn subject_id(&self) -> Uuid {
        *self.order.id_typed().as_uuid()
    }

    fn subject_type(&self) -> &'static str {
        "order"
    }
}
