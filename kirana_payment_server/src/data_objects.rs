//! Request and response payloads for the REST API.

use esewa_tools::PaymentFormData;
use kirana_payment_engine::{
    db_types::{AmountBreakdown, CustomerInfo, OrderItem, OrderStatusType, PaymentMethod, TransactionStatus},
    payment_objects::RefundKind,
};
use kpg_common::Rupees;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// The checkout payload for a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub subtotal: Rupees,
    #[serde(default)]
    pub shipping_fee: Rupees,
    #[serde(default)]
    pub tax: Rupees,
    pub total: Rupees,
    pub payment_method: PaymentMethod,
}

/// Opens a gateway payment attempt. The amount components must sum to the order total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: i64,
    #[serde(flatten)]
    pub amounts: AmountBreakdown,
}

/// The query string eSewa appends to its browser redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    /// The base64 blob exactly as the gateway appended it.
    pub data: String,
}

/// What the storefront needs to render the eSewa checkout form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateResponse {
    pub success: bool,
    pub transaction_id: String,
    /// False when the ledger row could not be written. The payment still goes ahead, and
    /// verification will have to answer from the gateway report alone.
    pub ledger_recorded: bool,
    pub form: PaymentFormData,
}

/// The outcome of a verification callback, as agreed with the gateway's status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// True when the payment stands as captured after this call.
    pub success: bool,
    pub transaction_id: String,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    /// Present when this verification also moved the linked order along.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatusType>,
    /// Human-readable note about anything an operator should look at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub transaction_id: String,
    pub kind: RefundKind,
}
