use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kirana_payment_engine::{
    db_types::{Json, NewOrder, Order, OrderStatusType},
    events::EventProducers,
    order_objects::OrderChanged,
    traits::PaymentGatewayError,
    OrderFlowApi,
};
use serde_json::json;

use super::{helpers::post_request, mocks::MockPaymentsDb};
use crate::routes::{CreateOrderRoute, UpdateOrderStatusRoute};

fn checkout_payload() -> serde_json::Value {
    json!({
        "customer": {
            "customer_id": "cust-42",
            "name": "Anita Gurung",
            "email": "anita@example.com",
            "phone": "9841000000",
            "delivery_address": "Thamel, Kathmandu"
        },
        "items": [
            {"product_id": "sku-001", "name": "Tokla Tea 500g", "unit_price": 340, "quantity": 1},
            {"product_id": "sku-002", "name": "Wai Wai (dozen)", "unit_price": 100, "quantity": 2}
        ],
        "subtotal": 540,
        "total": 540,
        "payment_method": "esewa"
    })
}

#[actix_web::test]
async fn create_order_stores_the_checkout_snapshot() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/orders", &checkout_payload(), configure_create).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["id"], 1);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_method"], "esewa");
    assert_eq!(order["total"], 540);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert!(order["order_number"].as_str().unwrap().starts_with("KD"));
}

#[actix_web::test]
async fn an_unbalanced_checkout_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut payload = checkout_payload();
    payload["total"] = json!(999);
    let (status, body) = post_request("/orders", &payload, configure_create).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("do not reconcile"), "unexpected body: {body}");
}

#[actix_web::test]
async fn advancing_an_order_reports_the_change() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"status": "confirmed"});
    let (status, body) = post_request("/orders/1/status", &payload, configure_update_ok).await;
    assert_eq!(status, StatusCode::OK);
    let change: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(change["old_status"], "pending");
    assert_eq!(change["order"]["status"], "confirmed");
}

#[actix_web::test]
async fn skipping_fulfilment_steps_is_refused() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"status": "shipped"});
    let (status, body) = post_request("/orders/1/status", &payload, configure_update_refused).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot move from"), "unexpected body: {body}");
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_insert_order().returning(|order| Ok(stored_order(order)));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(CreateOrderRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn configure_update_ok(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_update_order_status().returning(|order_id, new_status| {
        let mut order = stored_order(sample_new_order());
        order.id = order_id;
        order.status = new_status;
        Ok(OrderChanged::new(OrderStatusType::Pending, order))
    });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(UpdateOrderStatusRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn configure_update_refused(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_update_order_status().returning(|_, new_status| {
        Err(PaymentGatewayError::InvalidStatusChange { from: OrderStatusType::Pending, to: new_status })
    });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(UpdateOrderStatusRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn sample_new_order() -> NewOrder {
    serde_json::from_value(checkout_payload())
        .map(
            |req: crate::data_objects::CreateOrderRequest| {
                NewOrder::build(req.customer, req.items, req.subtotal, req.shipping_fee, req.tax, req.total, req.payment_method)
                    .unwrap()
            },
        )
        .unwrap()
}

// Mock response to `insert_order`: the row as the database would return it.
fn stored_order(order: NewOrder) -> Order {
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap();
    Order {
        id: 1,
        order_number: order.order_number,
        customer_id: order.customer_id,
        customer_name: order.customer_name,
        customer_email: order.customer_email,
        customer_phone: order.customer_phone,
        delivery_address: order.delivery_address,
        items: Json(order.items),
        subtotal: order.subtotal,
        shipping_fee: order.shipping_fee,
        tax: order.tax,
        total: order.total,
        payment_method: order.payment_method,
        status: OrderStatusType::Pending,
        created_at: now,
        updated_at: now,
    }
}
