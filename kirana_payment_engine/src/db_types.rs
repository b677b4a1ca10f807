//! Database types for the order and payment ledger.
//!
//! Everything in this module maps 1:1 onto a table row or a column value. The state machines for orders
//! and transactions also live here, next to the types they govern, so that every call site shares the
//! same definition of a legal transition.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use kpg_common::Rupees;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
// Re-exported so that consumers can build `Order` values without naming sqlx themselves.
pub use sqlx::types::Json;
use thiserror::Error;

use crate::helpers::new_order_number;

//--------------------------------------     OrderNumber    ---------------------------------------------------------

/// The customer-facing order key, e.g. `KD20260823-4821`.
///
/// Order numbers are matched case-insensitively. The database column carries `COLLATE NOCASE`, and
/// [`OrderNumber::normalized`] gives the canonical upper-case spelling for logs and comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn new<S: Into<String>>(number: S) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical spelling: trimmed and upper-cased.
    pub fn normalized(&self) -> OrderNumber {
        OrderNumber(self.0.trim().to_uppercase())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------    TransactionId   ---------------------------------------------------------

/// The merchant-generated key for a payment attempt. It doubles as the gateway's `transaction_uuid`, so
/// it must be unique across the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Derives a fresh transaction id from the order's internal id and the current time, millisecond
    /// resolution. Two attempts for the same order therefore get distinct ids.
    pub fn generate(order_id: i64, now: DateTime<Utc>) -> Self {
        Self(format!("{order_id}-{}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------    PaymentMethod   ---------------------------------------------------------

/// How the customer chose to pay at checkout. Only gateway orders ever touch the transaction ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Esewa,
}

impl PaymentMethod {
    /// True when payment happens through an online gateway rather than cash at the door.
    pub fn is_gateway(&self) -> bool {
        matches!(self, PaymentMethod::Esewa)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Esewa => "esewa",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0} is not a recognised value for this field")]
pub struct InvalidEnumValue(pub String);

impl std::str::FromStr for PaymentMethod {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cod" | "cash_on_delivery" => Ok(PaymentMethod::Cod),
            "esewa" => Ok(PaymentMethod::Esewa),
            other => Err(InvalidEnumValue(other.to_string())),
        }
    }
}

//--------------------------------------   OrderStatusType  ---------------------------------------------------------

/// The fulfilment lifecycle of an order.
///
/// Forward movement is one step at a time: `pending → confirmed → processing → shipped →
/// out_for_delivery → delivered`. Any non-terminal order can be cancelled. `delivered` and `cancelled`
/// are terminal, and skipping ahead (e.g. `confirmed → shipped`) is never allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatusType {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// The next status in the fulfilment sequence, or `None` for `delivered` and `cancelled`.
    pub fn next_in_sequence(&self) -> Option<OrderStatusType> {
        use OrderStatusType::*;
        match self {
            Pending => Some(Confirmed),
            Confirmed => Some(Processing),
            Processing => Some(Shipped),
            Shipped => Some(OutForDelivery),
            OutForDelivery => Some(Delivered),
            Delivered | Cancelled => None,
        }
    }

    /// Whether moving from `self` to `new` is a legal transition. A same-status "change" is not.
    pub fn is_valid_transition(self, new: OrderStatusType) -> bool {
        if self == new {
            return false;
        }
        if new == OrderStatusType::Cancelled {
            return !self.is_terminal();
        }
        self.next_in_sequence() == Some(new)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use OrderStatusType::*;
        let s = match self {
            Pending => "pending",
            Confirmed => "confirmed",
            Processing => "processing",
            Shipped => "shipped",
            OutForDelivery => "out_for_delivery",
            Delivered => "delivered",
            Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatusType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use OrderStatusType::*;
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Pending),
            "confirmed" => Ok(Confirmed),
            "processing" => Ok(Processing),
            "shipped" => Ok(Shipped),
            "out_for_delivery" => Ok(OutForDelivery),
            "delivered" => Ok(Delivered),
            "cancelled" => Ok(Cancelled),
            other => Err(InvalidEnumValue(other.to_string())),
        }
    }
}

//--------------------------------------  TransactionStatus ---------------------------------------------------------

/// The lifecycle of a gateway payment attempt, as recorded in the ledger.
///
/// `INITIATED` is ours; every other status is only ever written after the gateway's status endpoint has
/// confirmed it. The legal moves are
///
/// * `INITIATED | PENDING | AMBIGUOUS → PENDING | COMPLETE | AMBIGUOUS | NOT_FOUND | CANCELED`
/// * `COMPLETE → PARTIAL_REFUND | FULL_REFUND`
/// * `PARTIAL_REFUND → FULL_REFUND`
///
/// `NOT_FOUND` and `CANCELED` are terminal failures. `COMPLETE` never regresses to a non-refund status,
/// which is what makes verification idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Initiated,
    Pending,
    Complete,
    PartialRefund,
    FullRefund,
    Ambiguous,
    NotFound,
    Canceled,
}

impl TransactionStatus {
    /// Statuses that end the verification lifecycle. `verified_at` is stamped the first time one of
    /// these is recorded.
    pub fn is_terminal(&self) -> bool {
        use TransactionStatus::*;
        matches!(self, Complete | NotFound | Canceled)
    }

    /// A retryable status allows another verification attempt later.
    pub fn is_retryable(&self) -> bool {
        use TransactionStatus::*;
        matches!(self, Initiated | Pending | Ambiguous)
    }

    pub fn is_refund(&self) -> bool {
        use TransactionStatus::*;
        matches!(self, PartialRefund | FullRefund)
    }

    /// Whether the ledger may move from `self` to `new`. Recording the same status twice is a no-op
    /// rather than a transition, so `self == new` returns false here.
    pub fn is_valid_transition(self, new: TransactionStatus) -> bool {
        use TransactionStatus::*;
        if self == new {
            return false;
        }
        match (self, new) {
            (Initiated | Pending | Ambiguous, Pending | Complete | Ambiguous | NotFound | Canceled) => true,
            (Complete, PartialRefund | FullRefund) => true,
            (PartialRefund, FullRefund) => true,
            _ => false,
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use TransactionStatus::*;
        let s = match self {
            Initiated => "INITIATED",
            Pending => "PENDING",
            Complete => "COMPLETE",
            PartialRefund => "PARTIAL_REFUND",
            FullRefund => "FULL_REFUND",
            Ambiguous => "AMBIGUOUS",
            NotFound => "NOT_FOUND",
            Canceled => "CANCELED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use TransactionStatus::*;
        match s.trim().to_uppercase().as_str() {
            "INITIATED" => Ok(Initiated),
            "PENDING" => Ok(Pending),
            "COMPLETE" => Ok(Complete),
            "PARTIAL_REFUND" => Ok(PartialRefund),
            "FULL_REFUND" => Ok(FullRefund),
            "AMBIGUOUS" => Ok(Ambiguous),
            "NOT_FOUND" => Ok(NotFound),
            "CANCELED" | "CANCELLED" => Ok(Canceled),
            other => Err(InvalidEnumValue(other.to_string())),
        }
    }
}

//--------------------------------------      OrderItem     ---------------------------------------------------------

/// A single line of the cart, frozen at checkout time. Prices here never change after the order is
/// placed, even if the catalogue does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Rupees,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OrderItem {
    pub fn new<S1: Into<String>, S2: Into<String>>(product_id: S1, name: S2, unit_price: Rupees, quantity: i64) -> Self {
        Self { product_id: product_id.into(), name: name.into(), unit_price, quantity, image_url: None }
    }

    pub fn line_total(&self) -> Rupees {
        self.unit_price * self.quantity
    }
}

//--------------------------------------    CustomerInfo    ---------------------------------------------------------

/// The contact and delivery snapshot taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub delivery_address: String,
}

//--------------------------------------        Order       ---------------------------------------------------------

/// A full order row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    /// Internal key. Never shown to customers; use [`Order::order_number`] for that.
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub items: Json<Vec<OrderItem>>,
    pub subtotal: Rupees,
    pub shipping_fee: Rupees,
    pub tax: Rupees,
    pub total: Rupees,
    pub payment_method: PaymentMethod,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items(&self) -> &[OrderItem] {
        &self.items.0
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} ({}, {} via {})", self.order_number, self.status, self.total, self.payment_method)
    }
}

//--------------------------------------      NewOrder      ---------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum OrderValidationError {
    #[error("order totals do not reconcile: {subtotal} + {shipping_fee} + {tax} != {total}")]
    TotalMismatch { subtotal: Rupees, shipping_fee: Rupees, tax: Rupees, total: Rupees },
    #[error("an order must contain at least one item")]
    NoItems,
    #[error("item '{0}' has a non-positive quantity")]
    InvalidQuantity(String),
    #[error("order amounts cannot be negative")]
    NegativeAmount,
    #[error("customer details are incomplete: {0} is missing")]
    IncompleteCustomer(&'static str),
}

/// An order as it arrives from checkout, before it has been written to the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Rupees,
    pub shipping_fee: Rupees,
    pub tax: Rupees,
    pub total: Rupees,
    pub payment_method: PaymentMethod,
}

impl NewOrder {
    /// Validates the checkout payload and assigns a fresh order number.
    ///
    /// The invariants enforced here hold for every order row ever written: at least one item, no
    /// negative amounts, complete customer details, and `subtotal + shipping_fee + tax == total`.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        customer: CustomerInfo,
        items: Vec<OrderItem>,
        subtotal: Rupees,
        shipping_fee: Rupees,
        tax: Rupees,
        total: Rupees,
        payment_method: PaymentMethod,
    ) -> Result<Self, OrderValidationError> {
        if items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderValidationError::InvalidQuantity(item.name.clone()));
        }
        let amounts = [subtotal, shipping_fee, tax, total];
        if amounts.iter().any(Rupees::is_negative) || items.iter().any(|i| i.unit_price.is_negative()) {
            return Err(OrderValidationError::NegativeAmount);
        }
        if subtotal + shipping_fee + tax != total {
            return Err(OrderValidationError::TotalMismatch { subtotal, shipping_fee, tax, total });
        }
        let missing_field = [
            ("customer_id", &customer.customer_id),
            ("name", &customer.name),
            ("email", &customer.email),
            ("phone", &customer.phone),
            ("delivery_address", &customer.delivery_address),
        ]
        .into_iter()
        .find_map(|(field, value)| value.trim().is_empty().then_some(field));
        if let Some(field) = missing_field {
            return Err(OrderValidationError::IncompleteCustomer(field));
        }
        Ok(Self {
            order_number: new_order_number(Utc::now(), &mut rand::thread_rng()),
            customer_id: customer.customer_id,
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            delivery_address: customer.delivery_address,
            items,
            subtotal,
            shipping_fee,
            tax,
            total,
            payment_method,
        })
    }

    /// Replaces the order number with a newly generated one. Used when an insert loses the race on the
    /// unique order-number constraint.
    pub fn refresh_order_number(&mut self) {
        self.order_number = new_order_number(Utc::now(), &mut rand::thread_rng());
    }
}

//--------------------------------------   AmountBreakdown  ---------------------------------------------------------

/// The amount components of a gateway payment. The gateway signs over their sum, so the components are
/// stored individually and never recomputed after initiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub amount: Rupees,
    #[serde(default)]
    pub tax_amount: Rupees,
    #[serde(default)]
    pub service_charge: Rupees,
    #[serde(default)]
    pub delivery_charge: Rupees,
}

impl AmountBreakdown {
    pub fn new(amount: Rupees, tax_amount: Rupees, service_charge: Rupees, delivery_charge: Rupees) -> Self {
        Self { amount, tax_amount, service_charge, delivery_charge }
    }

    /// A breakdown where the base amount carries everything and all extra charges are zero.
    pub fn of_total(total: Rupees) -> Self {
        Self::new(total, Rupees::from(0), Rupees::from(0), Rupees::from(0))
    }

    pub fn total(&self) -> Rupees {
        self.amount + self.tax_amount + self.service_charge + self.delivery_charge
    }

    pub fn has_negative_component(&self) -> bool {
        [self.amount, self.tax_amount, self.service_charge, self.delivery_charge].iter().any(Rupees::is_negative)
    }
}

//-------------------------------------- PaymentTransaction ---------------------------------------------------------

/// A ledger row for one payment attempt against an order.
///
/// Rows are inserted as `INITIATED` and only ever updated in place; the ledger is append-only at the
/// row level and nothing is deleted from it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    pub transaction_id: TransactionId,
    pub order_id: i64,
    pub amount: Rupees,
    pub tax_amount: Rupees,
    pub service_charge: Rupees,
    pub delivery_charge: Rupees,
    pub total_amount: Rupees,
    pub status: TransactionStatus,
    /// The gateway's own reference for the payment. Only present once a verification has returned
    /// `COMPLETE`.
    pub gateway_ref_id: Option<String>,
    /// Set the first time a verification lands on a terminal status.
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn breakdown(&self) -> AmountBreakdown {
        AmountBreakdown::new(self.amount, self.tax_amount, self.service_charge, self.delivery_charge)
    }
}

impl Display for PaymentTransaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transaction {} for order #{} ({}, {})", self.transaction_id, self.order_id, self.total_amount, self.status)
    }
}

/// The insertable form of a ledger row. The status is implicitly `INITIATED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentTransaction {
    pub transaction_id: TransactionId,
    pub order_id: i64,
    pub amount: Rupees,
    pub tax_amount: Rupees,
    pub service_charge: Rupees,
    pub delivery_charge: Rupees,
    pub total_amount: Rupees,
}

impl NewPaymentTransaction {
    pub fn new(order_id: i64, breakdown: AmountBreakdown, now: DateTime<Utc>) -> Self {
        Self {
            transaction_id: TransactionId::generate(order_id, now),
            order_id,
            amount: breakdown.amount,
            tax_amount: breakdown.tax_amount,
            service_charge: breakdown.service_charge,
            delivery_charge: breakdown.delivery_charge,
            total_amount: breakdown.total(),
        }
    }
}
