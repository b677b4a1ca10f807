//! Order notification hooks.
//!
//! The engine publishes order events; this module turns them into HTTP POSTs against the
//! storefront's notification endpoint. Delivery is best effort: failures are logged and swallowed,
//! and never block or fail an order flow.

use std::sync::Arc;

use futures::future::BoxFuture;
use kirana_payment_engine::{
    db_types::{Order, OrderStatusType},
    events::{EventHandlers, EventHooks, OrderCreatedEvent, OrderStatusChangedEvent},
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

/// Capacity of each event channel before publishers start waiting.
const EVENT_BUFFER_SIZE: usize = 25;

/// The payload POSTed to `KPG_NOTIFY_URL` for every order event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub event: String,
    pub order_id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub order_status: OrderStatusType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<OrderStatusType>,
    /// Additional mailboxes (the ops inbox) that get a copy of this notification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_recipients: Vec<String>,
}

impl NotificationRequest {
    fn order_created(order: &Order, ops_email: Option<&str>) -> Self {
        Self {
            event: "order_created".into(),
            order_id: order.id,
            order_number: order.order_number.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            order_status: order.status,
            old_status: None,
            extra_recipients: ops_email.map(|s| vec![s.to_string()]).unwrap_or_default(),
        }
    }

    fn status_changed(ev: &OrderStatusChangedEvent) -> Self {
        Self {
            event: "order_status_changed".into(),
            order_id: ev.order.id,
            order_number: ev.order.order_number.to_string(),
            customer_name: ev.order.customer_name.clone(),
            customer_email: ev.order.customer_email.clone(),
            order_status: ev.new_status,
            old_status: Some(ev.old_status),
            extra_recipients: Vec::new(),
        }
    }
}

struct NotificationDispatcher {
    client: reqwest::Client,
    url: String,
    ops_email: Option<String>,
}

impl NotificationDispatcher {
    fn new(url: String, ops_email: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), url, ops_email }
    }

    async fn dispatch(&self, request: NotificationRequest) {
        let event = request.event.clone();
        let order_number = request.order_number.clone();
        match self.client.post(&self.url).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("📧️ Delivered {event} notification for order {order_number}");
            },
            Ok(response) => {
                error!(
                    "📧️ The notification endpoint rejected the {event} notification for order {order_number}: {}",
                    response.status()
                );
            },
            Err(e) => {
                error!("📧️ Could not deliver the {event} notification for order {order_number}. {e}");
            },
        }
    }
}

/// Builds the event handlers for the configured notification endpoint.
///
/// Without `KPG_NOTIFY_URL`, events are still consumed and logged so that order flows never back up
/// behind a full channel.
pub fn create_notification_handlers(config: &ServerConfig) -> EventHandlers {
    let mut hooks = EventHooks::default();
    match &config.notify_url {
        Some(url) => {
            info!("📧️ Order notifications will be POSTed to {url}");
            let dispatcher = Arc::new(NotificationDispatcher::new(url.clone(), config.ops_email.clone()));
            let d = Arc::clone(&dispatcher);
            hooks.on_order_created(move |ev: OrderCreatedEvent| {
                let d = Arc::clone(&d);
                let fut: BoxFuture<'static, ()> = Box::pin(async move {
                    let request = NotificationRequest::order_created(&ev.order, d.ops_email.as_deref());
                    d.dispatch(request).await;
                });
                fut
            });
            let d = dispatcher;
            hooks.on_order_status_changed(move |ev: OrderStatusChangedEvent| {
                let d = Arc::clone(&d);
                let fut: BoxFuture<'static, ()> = Box::pin(async move {
                    d.dispatch(NotificationRequest::status_changed(&ev)).await;
                });
                fut
            });
        },
        None => {
            hooks.on_order_created(|ev: OrderCreatedEvent| {
                let fut: BoxFuture<'static, ()> = Box::pin(async move {
                    info!("📧️ New order {}. No notification endpoint is configured.", ev.order.order_number);
                });
                fut
            });
            hooks.on_order_status_changed(|ev: OrderStatusChangedEvent| {
                let fut: BoxFuture<'static, ()> = Box::pin(async move {
                    info!(
                        "📧️ Order {} moved from {} to {}. No notification endpoint is configured.",
                        ev.order.order_number, ev.old_status, ev.new_status
                    );
                });
                fut
            });
        },
    }
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
