use kpg_common::Rupees;
use log::*;
use sqlx::SqlitePool;

use crate::{
    db_types::{
        NewOrder,
        NewPaymentTransaction,
        Order,
        OrderNumber,
        OrderStatusType,
        PaymentTransaction,
        TransactionId,
        TransactionStatus,
    },
    order_objects::OrderChanged,
    payment_objects::{RefundKind, VerifiedStatus, VerifyAnomaly, VerifyOutcome},
    sqlite::db::{self, orders, transactions},
    traits::{OrderApiError, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError},
};

/// The SQLite implementation of the payment gateway storage contract.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connects to the database named by `KPG_DATABASE_URL` (or the default path).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = db::new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_payment_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<PaymentTransaction>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::fetch_transaction(transaction_id, &mut conn).await?;
        Ok(txn)
    }

    async fn fetch_latest_transaction_for_order(
        &self,
        order_id: i64,
    ) -> Result<Option<PaymentTransaction>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::fetch_latest_transaction_for_order(order_id, &mut conn).await?;
        Ok(txn)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(&order, &mut conn).await?;
        info!("🗃️ Order {} created for customer {} ({})", order.order_number, order.customer_id, order.total);
        Ok(order)
    }

    async fn insert_transaction(
        &self,
        transaction: NewPaymentTransaction,
    ) -> Result<PaymentTransaction, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::insert_transaction(&transaction, &mut conn).await?;
        info!("🗃️ Transaction {} recorded as INITIATED for order #{}", txn.transaction_id, txn.order_id);
        Ok(txn)
    }

    async fn record_verified_status(
        &self,
        transaction_id: &TransactionId,
        claimed_total: Rupees,
        verified: VerifiedStatus,
    ) -> Result<VerifyOutcome, PaymentGatewayError> {
        use TransactionStatus::*;
        let mut tx = self.pool.begin().await?;
        let txn = transactions::fetch_transaction(transaction_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::TransactionNotFound(transaction_id.clone()))?;
        let stored = txn.status;
        let stored_total = txn.total_amount;

        // A recorded COMPLETE never regresses. Refunds are the only onward moves.
        if stored == Complete {
            let outcome = match verified.status {
                Complete => VerifyOutcome::settled(txn),
                PartialRefund | FullRefund => {
                    let updated =
                        transactions::update_transaction_status(transaction_id, verified.status, None, false, &mut tx)
                            .await?;
                    info!("🗃️ Transaction {transaction_id} moved from COMPLETE to {}", updated.status);
                    VerifyOutcome::settled(updated)
                },
                other => VerifyOutcome::settled(txn)
                    .with_anomaly(VerifyAnomaly::TransitionRefused { from: stored, to: other }),
            };
            tx.commit().await?;
            return Ok(outcome);
        }

        // The claimed amount must agree with the ledger before any verdict gets applied.
        if claimed_total != stored_total {
            let txn = if stored.is_retryable() && stored != Ambiguous {
                transactions::update_transaction_status(transaction_id, Ambiguous, None, false, &mut tx).await?
            } else {
                txn
            };
            tx.commit().await?;
            error!(
                "🗃️ Transaction {transaction_id} claims a total of {claimed_total} but the ledger holds \
                 {stored_total}. Status is now {}.",
                txn.status
            );
            return Ok(VerifyOutcome::settled(txn)
                .with_anomaly(VerifyAnomaly::AmountMismatch { claimed: claimed_total, stored: stored_total }));
        }

        // Re-recording the stored status is a no-op, not a transition.
        if verified.status == stored {
            tx.commit().await?;
            return Ok(VerifyOutcome::settled(txn));
        }
        if !stored.is_valid_transition(verified.status) {
            tx.commit().await?;
            return Ok(VerifyOutcome::settled(txn)
                .with_anomaly(VerifyAnomaly::TransitionRefused { from: stored, to: verified.status }));
        }

        let ref_id = if verified.status == Complete { verified.ref_id.as_deref() } else { None };
        let stamp_verified = verified.status.is_terminal();
        let updated =
            transactions::update_transaction_status(transaction_id, verified.status, ref_id, stamp_verified, &mut tx)
                .await?;
        let order_id = updated.order_id;
        let mut outcome = VerifyOutcome::settled(updated);
        if verified.status == Complete {
            outcome.first_completion = true;
            let order = orders::fetch_order_by_id(order_id, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
            if order.status == OrderStatusType::Pending {
                let confirmed = orders::update_order_status(order.id, OrderStatusType::Confirmed, &mut tx).await?;
                info!("🗃️ Order {} confirmed on payment {transaction_id}", confirmed.order_number);
                outcome.order_update = Some(OrderChanged::new(OrderStatusType::Pending, confirmed));
            } else {
                // Paid, but the order has been touched by someone else in the meantime. Record the
                // payment and flag the order for a human.
                outcome.anomaly = Some(VerifyAnomaly::OrderNotTransitioned { order_status: order.status });
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    async fn record_refund(
        &self,
        transaction_id: &TransactionId,
        kind: RefundKind,
    ) -> Result<PaymentTransaction, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let txn = transactions::fetch_transaction(transaction_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::TransactionNotFound(transaction_id.clone()))?;
        let new_status = kind.as_status();
        if !txn.status.is_valid_transition(new_status) {
            return Err(PaymentGatewayError::InvalidRefund {
                transaction_id: transaction_id.clone(),
                status: txn.status,
            });
        }
        let updated = transactions::update_transaction_status(transaction_id, new_status, None, false, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Transaction {transaction_id} marked as {new_status}");
        Ok(updated)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<OrderChanged, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_id(order_id, &mut tx)
            .await?
            .ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        if order.status == new_status {
            return Err(PaymentGatewayError::OrderModificationNoOp);
        }
        if !order.status.is_valid_transition(new_status) {
            return Err(PaymentGatewayError::InvalidStatusChange { from: order.status, to: new_status });
        }
        let updated = orders::update_order_status(order_id, new_status, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order {} moved from {} to {new_status}", updated.order_number, order.status);
        Ok(OrderChanged::new(order.status, updated))
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
