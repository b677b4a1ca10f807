use std::fmt::Debug;

use chrono::Utc;
use kpg_common::Rupees;
use log::*;

use crate::{
    db_types::{AmountBreakdown, NewOrder, NewPaymentTransaction, Order, OrderStatusType, PaymentTransaction, TransactionId},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    order_objects::OrderChanged,
    payment_objects::{RefundKind, VerifiedStatus, VerifyAnomaly, VerifyOutcome},
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// How often `process_new_order` will regenerate the order number after losing the uniqueness race.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// `OrderFlowApi` drives every mutation of order and payment state: order creation, payment
/// initiation, applying verified gateway results, refunds and fulfilment updates.
///
/// Order events are published after the corresponding database write has committed, and exactly once
/// per distinct change.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Submits a brand-new order.
    ///
    /// The order must already have passed [`NewOrder::build`] validation. On the rare same-day order
    /// number collision the number is regenerated and the insert retried a couple of times before the
    /// error is surfaced.
    pub async fn process_new_order(&self, mut order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut attempts = ORDER_NUMBER_ATTEMPTS;
        let order = loop {
            match self.db.insert_order(order.clone()).await {
                Ok(order) => break order,
                Err(PaymentGatewayError::OrderNumberAlreadyExists(number)) if attempts > 1 => {
                    attempts -= 1;
                    debug!("🔄️📦️ Order number {number} already taken. Generating a new one.");
                    order.refresh_order_number();
                },
                Err(e) => return Err(e),
            }
        };
        debug!("🔄️📦️ Order {} saved with id {}", order.order_number, order.id);
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Opens a payment attempt against an order and returns the `INITIATED` ledger row.
    ///
    /// Only a `pending` order paying through a gateway can be initiated, the amount components must be
    /// non-negative, and their sum must equal the order total. The caller signs the gateway form from
    /// the returned row, never from its own inputs.
    pub async fn initiate_payment(
        &self,
        order_id: i64,
        amounts: AmountBreakdown,
    ) -> Result<PaymentTransaction, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await
            .map_err(PaymentGatewayError::from)?
            .ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        if !order.payment_method.is_gateway() {
            return Err(PaymentGatewayError::OrderNotPayable {
                order_id,
                reason: format!("payment method is {}", order.payment_method),
            });
        }
        if order.status != OrderStatusType::Pending {
            return Err(PaymentGatewayError::OrderNotPayable {
                order_id,
                reason: format!("order is {}", order.status),
            });
        }
        if amounts.has_negative_component() {
            return Err(PaymentGatewayError::OrderNotPayable {
                order_id,
                reason: "amounts cannot be negative".into(),
            });
        }
        if amounts.total() != order.total {
            return Err(PaymentGatewayError::AmountMismatch {
                order_id,
                expected: order.total,
                actual: amounts.total(),
            });
        }
        let txn = NewPaymentTransaction::new(order.id, amounts, Utc::now());
        let txn = self.db.insert_transaction(txn).await?;
        debug!("🔄️💳️ Payment attempt {} opened for order {} ({})", txn.transaction_id, order.order_number, txn.total_amount);
        Ok(txn)
    }

    /// Applies a gateway verdict that has been confirmed by the gateway's status endpoint.
    ///
    /// `claimed_total` is whatever the untrusted redirect payload asserted; a mismatch against the
    /// ledger total parks the transaction as `AMBIGUOUS` regardless of the verdict. When the verdict
    /// records the first `COMPLETE`, the linked order is confirmed in the same database transaction
    /// and a status-changed event goes out once that commits.
    pub async fn record_verification(
        &self,
        transaction_id: &TransactionId,
        claimed_total: Rupees,
        verified: VerifiedStatus,
    ) -> Result<VerifyOutcome, PaymentGatewayError> {
        let outcome = self.db.record_verified_status(transaction_id, claimed_total, verified).await?;
        match &outcome.anomaly {
            Some(VerifyAnomaly::AmountMismatch { claimed, stored }) => {
                warn!(
                    "🔄️🚨️ Verification of {transaction_id} refused. The claimed total ({claimed}) does not match \
                     the ledger ({stored}). The transaction is parked as {}.",
                    outcome.transaction.status
                );
            },
            Some(VerifyAnomaly::OrderNotTransitioned { order_status }) => {
                warn!(
                    "🔄️🚨️ Payment {transaction_id} is COMPLETE but order #{} is {order_status} and was left alone.",
                    outcome.transaction.order_id
                );
            },
            Some(VerifyAnomaly::TransitionRefused { from, to }) => {
                warn!("🔄️🚨️ Gateway reported {to} for {transaction_id}, but the ledger holds {from}. Keeping {from}.");
            },
            None => {},
        }
        if outcome.first_completion {
            info!(
                "🔄️💳️ Payment {transaction_id} is COMPLETE (ref {})",
                outcome.transaction.gateway_ref_id.as_deref().unwrap_or("n/a")
            );
        }
        if let Some(change) = &outcome.order_update {
            self.call_order_status_changed_hook(change).await;
        }
        Ok(outcome)
    }

    /// Records a refund the gateway has reported against a completed payment.
    pub async fn record_refund(
        &self,
        transaction_id: &TransactionId,
        kind: RefundKind,
    ) -> Result<PaymentTransaction, PaymentGatewayError> {
        let txn = self.db.record_refund(transaction_id, kind).await?;
        info!("🔄️💸️ Transaction {} is now {}", txn.transaction_id, txn.status);
        Ok(txn)
    }

    /// Moves an order along its fulfilment lifecycle and publishes the change.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<OrderChanged, PaymentGatewayError> {
        let changed = self.db.update_order_status(order_id, new_status).await?;
        debug!("🔄️📦️ Order {} moved from {} to {}", changed.order.order_number, changed.old_status, new_status);
        self.call_order_status_changed_hook(&changed).await;
        Ok(changed)
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producers {
            trace!("🔄️📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_status_changed_hook(&self, change: &OrderChanged) {
        for emitter in &self.producers.order_status_changed_producers {
            trace!("🔄️📦️ Notifying order status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(change.order.clone(), change.old_status);
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
