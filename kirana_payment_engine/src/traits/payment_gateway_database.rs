use kpg_common::Rupees;
use thiserror::Error;

use crate::{
    db_types::{
        NewOrder,
        NewPaymentTransaction,
        Order,
        OrderNumber,
        OrderStatusType,
        OrderValidationError,
        PaymentTransaction,
        TransactionId,
        TransactionStatus,
    },
    order_objects::OrderChanged,
    payment_objects::{RefundKind, VerifiedStatus, VerifyOutcome},
    traits::OrderApiError,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Order number {0} is already taken")]
    OrderNumberAlreadyExists(OrderNumber),
    #[error("Transaction {0} has already been initiated")]
    TransactionAlreadyExists(TransactionId),
    #[error("Order with internal id {0} does not exist")]
    OrderIdNotFound(i64),
    #[error("No transaction with id {0} exists in the ledger")]
    TransactionNotFound(TransactionId),
    #[error("{0}")]
    InvalidOrder(#[from] OrderValidationError),
    #[error("{0}")]
    QueryError(#[from] OrderApiError),
    #[error("Order {order_id} cannot take a gateway payment: {reason}")]
    OrderNotPayable { order_id: i64, reason: String },
    #[error("The initiation amounts sum to {actual} but order {order_id} totals {expected}")]
    AmountMismatch { order_id: i64, expected: Rupees, actual: Rupees },
    #[error("The requested status change is a no-op")]
    OrderModificationNoOp,
    #[error("An order cannot move from {from} to {to}")]
    InvalidStatusChange { from: OrderStatusType, to: OrderStatusType },
    #[error("A refund can only follow a completed payment; transaction {transaction_id} is {status}")]
    InvalidRefund { transaction_id: TransactionId, status: TransactionStatus },
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// The full database contract for the payment gateway.
///
/// Implementations own all mutations of order and ledger state. The flow APIs in
/// [`crate::OrderFlowApi`] only ever mutate through these methods, so the atomicity guarantees
/// documented here are the atomicity guarantees of the whole system.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + super::OrderManagement {
    /// The database connection URL, for logging.
    fn url(&self) -> &str;

    /// Stores a validated new order and returns the full row. Fails with
    /// [`PaymentGatewayError::OrderNumberAlreadyExists`] when the generated order number collides.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// Writes an `INITIATED` ledger row for a payment attempt.
    async fn insert_transaction(
        &self,
        transaction: NewPaymentTransaction,
    ) -> Result<PaymentTransaction, PaymentGatewayError>;

    /// Applies a verified gateway verdict to the ledger.
    ///
    /// This is the reconciliation unit of work. In one database transaction it
    /// * refuses the verdict (status forced to `AMBIGUOUS` where legal) when `claimed_total` differs
    ///   from the stored total, no matter what the gateway said,
    /// * otherwise moves the ledger row along its state machine, stamping `verified_at` on the first
    ///   terminal status and `gateway_ref_id` on `COMPLETE`,
    /// * and confirms the linked order when this call records the first `COMPLETE`.
    ///
    /// Either every row involved changes or none does. A verdict the state machine refuses leaves the
    /// ledger untouched and is reported through [`VerifyOutcome::anomaly`].
    async fn record_verified_status(
        &self,
        transaction_id: &TransactionId,
        claimed_total: Rupees,
        verified: VerifiedStatus,
    ) -> Result<VerifyOutcome, PaymentGatewayError>;

    /// Marks a completed transaction as refunded. No order state is touched.
    async fn record_refund(
        &self,
        transaction_id: &TransactionId,
        kind: RefundKind,
    ) -> Result<PaymentTransaction, PaymentGatewayError>;

    /// Moves an order along its lifecycle, rejecting no-ops and illegal jumps.
    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<OrderChanged, PaymentGatewayError>;

    /// Closes database connections.
    async fn close(&mut self) -> Result<(), PaymentGatewayError>;
}
