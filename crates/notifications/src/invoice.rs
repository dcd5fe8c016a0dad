use std::fmt::Write as _;

use bazaar_catalog::CatalogService;
use bazaar_core::ProductId;
use bazaar_events::{HookError, PostCommitHook};
use bazaar_sales::{Order, OrderPlaced};

use crate::{EmailMessage, NotificationService};

/// Rendered invoice text for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub subject: String,
    pub body: String,
}

impl Invoice {
    /// `product_name` resolves a display name per line; unknown products
    /// fall back to their id.
    pub fn render<F>(order: &Order, username: &str, product_name: F) -> Self
    where
        F: Fn(&ProductId) -> Option<String>,
    {
        let subject = format!("Invoice for Order #{}", order.id_typed());

        let mut body = format!("Hi {username},\n\nThank you for your order!\n\n");
        for item in order.items() {
            let name = product_name(&item.product_id).unwrap_or_else(|| item.product_id.to_string());
            let _ = writeln!(
                body,
                "- {name} x{} @ {} = {}",
                item.quantity,
                item.unit_price_at_purchase,
                item.line_total()
            );
        }
        let _ = write!(body, "\nTotal: {}\n", order.total());

        Self { subject, body }
    }
}

/// Emails an invoice to the buyer once an order is committed.
pub struct InvoiceHook<N, P> {
    mailer: N,
    catalog: P,
    from: String,
}

impl<N, P> InvoiceHook<N, P> {
    pub fn new(mailer: N, catalog: P, from: impl Into<String>) -> Self {
        Self {
            mailer,
            catalog,
            from: from.into(),
        }
    }
}

impl<N, P> PostCommitHook<OrderPlaced> for InvoiceHook<N, P>
where
    N: NotificationService,
    P: CatalogService,
{
    fn name(&self) -> &'static str {
        "invoice-email"
    }

    fn on_commit(&self, event: &OrderPlaced) -> Result<(), HookError> {
        let Some(to) = event.buyer_email.as_deref().filter(|e| !e.trim().is_empty()) else {
            tracing::info!(order_id = %event.order.id_typed(), "buyer has no email, invoice skipped");
            return Ok(());
        };

        let invoice = Invoice::render(&event.order, &event.buyer_username, |id| {
            self.catalog.product(*id).ok().map(|p| p.name)
        });

        self.mailer
            .send(&EmailMessage {
                from: self.from.clone(),
                to: to.to_string(),
                subject: invoice.subject,
                body: invoice.body,
            })
            .map_err(|e| HookError::new(e.to_string()))
    }
}
