#![allow(dead_code)]
//! Shared fixtures for the engine integration tests. Each test gets its own migrated database file in
//! the system temp directory.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use kirana_payment_engine::{
    db_types::{CustomerInfo, NewOrder, OrderItem, PaymentMethod},
    events::{EventHandlers, EventHooks, OrderCreatedEvent, OrderStatusChangedEvent},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};
use kpg_common::Rupees;

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to the test database")
}

pub fn customer(customer_id: &str) -> CustomerInfo {
    CustomerInfo {
        customer_id: customer_id.to_string(),
        name: "Anita Gurung".into(),
        email: "anita@example.com".into(),
        phone: "9841000000".into(),
        delivery_address: "Baluwatar, Kathmandu".into(),
    }
}

/// A small grocery basket totalling Rs 540 with free delivery.
pub fn tea_and_noodles(customer_id: &str, payment_method: PaymentMethod) -> NewOrder {
    let items = vec![
        OrderItem::new("sku-tea-500", "Tokla tea 500g", Rupees::from(340), 1),
        OrderItem::new("sku-waiwai-12", "Wai Wai dozen", Rupees::from(100), 2),
    ];
    NewOrder::build(
        customer(customer_id),
        items,
        Rupees::from(540),
        Rupees::from(0),
        Rupees::from(0),
        Rupees::from(540),
        payment_method,
    )
    .expect("order fixture should validate")
}

/// Captures every published event so tests can assert on exact counts.
#[derive(Clone, Default)]
pub struct EventSink {
    pub created: Arc<Mutex<Vec<OrderCreatedEvent>>>,
    pub status_changes: Arc<Mutex<Vec<OrderStatusChangedEvent>>>,
}

impl EventSink {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn transitions(&self) -> Vec<(String, String)> {
        self.status_changes
            .lock()
            .unwrap()
            .iter()
            .map(|ev| (ev.old_status.to_string(), ev.new_status.to_string()))
            .collect()
    }
}

/// Builds handlers that push every event into an [`EventSink`]. Call [`drain_events`] once all
/// producers are dropped to wait for the hooks to run.
pub fn collecting_hooks() -> (EventSink, EventHandlers) {
    let sink = EventSink::default();
    let mut hooks = EventHooks::default();
    let created = Arc::clone(&sink.created);
    hooks.on_order_created(move |ev| {
        let created = Arc::clone(&created);
        let fut: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
            created.lock().unwrap().push(ev);
        });
        fut
    });
    let changes = Arc::clone(&sink.status_changes);
    hooks.on_order_status_changed(move |ev| {
        let changes = Arc::clone(&changes);
        let fut: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
            changes.lock().unwrap().push(ev);
        });
        fut
    });
    let handlers = EventHandlers::new(16, hooks);
    (sink, handlers)
}

/// Runs the receive loops to completion. Hangs unless every producer clone has been dropped first.
pub async fn drain_events(handlers: EventHandlers) {
    if let Some(handler) = handlers.on_order_created {
        handler.start_handler().await;
    }
    if let Some(handler) = handlers.on_order_status_changed {
        handler.start_handler().await;
    }
}
