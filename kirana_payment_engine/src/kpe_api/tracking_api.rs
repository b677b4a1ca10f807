use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderNumber},
    order_objects::{OrderWithPayment, PaymentStanding},
    traits::{OrderApiError, OrderManagement},
};

/// The read-only API behind the customer tracking endpoints. Nothing here can mutate state.
pub struct TrackingApi<B> {
    db: B,
}

impl<B> Debug for TrackingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrackingApi")
    }
}

impl<B> TrackingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TrackingApi<B>
where B: OrderManagement
{
    /// Looks an order up by its customer-facing number, case-insensitively, and attaches the payment
    /// standing derived from the latest ledger row.
    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<OrderWithPayment>, OrderApiError> {
        let number = number.normalized();
        trace!("🔍️ Tracking lookup for order {number}");
        let Some(order) = self.db.fetch_order_by_number(&number).await? else {
            return Ok(None);
        };
        let standing = self.standing_for(&order).await?;
        Ok(Some(OrderWithPayment::new(order, standing)))
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError> {
        self.db.fetch_order_by_id(order_id).await
    }

    /// Every order the customer has placed, newest first.
    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }

    /// The payment standing for an order, or `None` when the order does not exist.
    pub async fn payment_status_for_order(&self, order_id: i64) -> Result<Option<PaymentStanding>, OrderApiError> {
        let Some(order) = self.db.fetch_order_by_id(order_id).await? else {
            return Ok(None);
        };
        let standing = self.standing_for(&order).await?;
        Ok(Some(standing))
    }

    async fn standing_for(&self, order: &Order) -> Result<PaymentStanding, OrderApiError> {
        let latest = if order.payment_method.is_gateway() {
            self.db.fetch_latest_transaction_for_order(order.id).await?
        } else {
            None
        };
        Ok(PaymentStanding::for_order(order, latest.as_ref()))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
