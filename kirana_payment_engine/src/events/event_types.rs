use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Fired once per successfully stored order, after the database write has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

impl Display for OrderCreatedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderCreatedEvent({})", self.order.order_number)
    }
}

/// Fired once per distinct order status transition, after the transition has committed. The embedded
/// order already carries `new_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        let new_status = order.status;
        Self { order, old_status, new_status }
    }
}

impl Display for OrderStatusChangedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderStatusChangedEvent({}: {} -> {})", self.order.order_number, self.old_status, self.new_status)
    }
}
