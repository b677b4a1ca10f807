//! View objects built on top of the raw database rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, PaymentMethod, PaymentTransaction, TransactionId, TransactionStatus};

/// The before-and-after of an order status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChanged {
    pub old_status: OrderStatusType,
    /// The order as it stands after the transition.
    pub order: Order,
}

impl OrderChanged {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

/// What a customer gets to see about the payment side of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentStanding {
    /// Cash is collected at the door. There is no ledger entry to report on.
    CashOnDelivery,
    /// A gateway order that has not been handed to the gateway yet.
    AwaitingInitiation,
    /// The latest ledger facts for a gateway payment attempt.
    Gateway {
        transaction_id: TransactionId,
        status: TransactionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        ref_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        verified_at: Option<DateTime<Utc>>,
    },
}

impl PaymentStanding {
    /// Derives the standing for an order from its latest ledger row, if any.
    pub fn for_order(order: &Order, latest_transaction: Option<&PaymentTransaction>) -> Self {
        if order.payment_method == PaymentMethod::Cod {
            return PaymentStanding::CashOnDelivery;
        }
        match latest_transaction {
            None => PaymentStanding::AwaitingInitiation,
            Some(txn) => PaymentStanding::Gateway {
                transaction_id: txn.transaction_id.clone(),
                status: txn.status,
                ref_id: txn.gateway_ref_id.clone(),
                verified_at: txn.verified_at,
            },
        }
    }

    pub fn is_settled(&self) -> bool {
        match self {
            PaymentStanding::CashOnDelivery => false,
            PaymentStanding::AwaitingInitiation => false,
            PaymentStanding::Gateway { status, .. } => *status == TransactionStatus::Complete || status.is_refund(),
        }
    }
}

/// An order together with its payment standing, as served by the tracking endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithPayment {
    pub order: Order,
    pub payment: PaymentStanding,
}

impl OrderWithPayment {
    pub fn new(order: Order, payment: PaymentStanding) -> Self {
        Self { order, payment }
    }
}
