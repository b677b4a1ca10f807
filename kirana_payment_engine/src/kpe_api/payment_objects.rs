//! Inputs and outcomes of the verification unit of work.

use kpg_common::Rupees;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderStatusType, PaymentTransaction, TransactionStatus},
    order_objects::OrderChanged,
};

/// A gateway verdict that has already been confirmed against the gateway's status endpoint.
///
/// Redirect payloads never make it into one of these; only the server-to-server status call does. That
/// is what entitles the engine to treat the status as fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedStatus {
    pub status: TransactionStatus,
    /// The gateway's reference for the payment, when it supplied one.
    pub ref_id: Option<String>,
}

impl VerifiedStatus {
    pub fn new(status: TransactionStatus, ref_id: Option<String>) -> Self {
        Self { status, ref_id }
    }

    pub fn complete<S: Into<String>>(ref_id: S) -> Self {
        Self::new(TransactionStatus::Complete, Some(ref_id.into()))
    }
}

/// Something a verification noticed that an operator should look at. Anomalies are reported, never
/// silently fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifyAnomaly {
    /// The caller claimed a different total than the ledger holds. The transaction is parked as
    /// `AMBIGUOUS` until an operator reconciles it.
    AmountMismatch { claimed: Rupees, stored: Rupees },
    /// The gateway confirmed payment, but the linked order was not sitting in `pending` and could not
    /// be confirmed.
    OrderNotTransitioned { order_status: OrderStatusType },
    /// The gateway reported a status the stored state is not allowed to move to. The ledger keeps the
    /// stored status.
    TransitionRefused { from: TransactionStatus, to: TransactionStatus },
}

/// What a call to record a verification actually did.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    /// The ledger row after the call.
    pub transaction: PaymentTransaction,
    /// Present when this verification moved the linked order from `pending` to `confirmed`.
    pub order_update: Option<OrderChanged>,
    /// True only on the call that first recorded `COMPLETE` for this transaction.
    pub first_completion: bool,
    pub anomaly: Option<VerifyAnomaly>,
}

impl VerifyOutcome {
    pub fn settled(transaction: PaymentTransaction) -> Self {
        Self { transaction, order_update: None, first_completion: false, anomaly: None }
    }

    pub fn with_anomaly(mut self, anomaly: VerifyAnomaly) -> Self {
        self.anomaly = Some(anomaly);
        self
    }

    /// Whether the payment stands as successfully captured after this call.
    pub fn is_paid(&self) -> bool {
        self.transaction.status == TransactionStatus::Complete
    }
}

/// The two refund flavours the gateway can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundKind {
    Partial,
    Full,
}

impl RefundKind {
    pub fn as_status(self) -> TransactionStatus {
        match self {
            RefundKind::Partial => TransactionStatus::PartialRefund,
            RefundKind::Full => TransactionStatus::FullRefund,
        }
    }
}
