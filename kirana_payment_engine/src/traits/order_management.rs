use thiserror::Error;

use crate::db_types::{Order, OrderNumber, PaymentTransaction, TransactionId};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read-only access to orders and the payment ledger.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError>;

    /// Looks an order up by its customer-facing number. The match is case-insensitive.
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;

    /// All orders ever placed by the customer, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError>;

    async fn fetch_payment_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<PaymentTransaction>, OrderApiError>;

    /// The most recently initiated ledger row for an order, if any.
    async fn fetch_latest_transaction_for_order(
        &self,
        order_id: i64,
    ) -> Result<Option<PaymentTransaction>, OrderApiError>;
}
