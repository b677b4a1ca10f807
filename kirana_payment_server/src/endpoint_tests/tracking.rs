use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kirana_payment_engine::{
    db_types::{Json, Order, OrderItem, OrderStatusType, PaymentMethod, PaymentTransaction, TransactionId, TransactionStatus},
    TrackingApi,
};
use serde_json::Value;

use super::{helpers::get_request, mocks::MockPaymentsDb};
use crate::routes::{OrderByNumberRoute, OrderPaymentStatusRoute, OrdersForCustomerRoute};

const ORDER_WITH_PAYMENT_JSON: &str = "{\"order\":{\"id\":1,\"order_number\":\"KD20260820-1001\",\"customer_id\":\"cust-42\",\
\"customer_name\":\"Anita Gurung\",\"customer_email\":\"anita@example.com\",\"customer_phone\":\"9841000000\",\
\"delivery_address\":\"Thamel, Kathmandu\",\"items\":[{\"product_id\":\"sku-001\",\"name\":\"Tokla Tea 500g\",\
\"unit_price\":340,\"quantity\":1},{\"product_id\":\"sku-002\",\"name\":\"Wai Wai (dozen)\",\"unit_price\":100,\
\"quantity\":2}],\"subtotal\":540,\"shipping_fee\":0,\"tax\":0,\"total\":540,\"payment_method\":\"esewa\",\
\"status\":\"pending\",\"created_at\":\"2026-08-20T09:30:00Z\",\"updated_at\":\"2026-08-20T09:30:00Z\"},\
\"payment\":{\"kind\":\"awaiting_initiation\"}}";

#[actix_web::test]
async fn order_by_number_reports_the_order_and_its_payment_standing() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/number/KD20260820-1001", configure_order_lookup).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_WITH_PAYMENT_JSON);
}

#[actix_web::test]
async fn a_lowercase_order_number_finds_the_same_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/number/kd20260820-1001", configure_order_lookup).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_WITH_PAYMENT_JSON);
}

#[actix_web::test]
async fn an_unknown_order_number_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/number/KD20269999-0000", configure_missing_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "{\"error\":\"The data was not found. Order KD20269999-0000 does not exist\"}");
}

#[actix_web::test]
async fn customer_history_lists_orders_newest_first() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/customer/cust-42", configure_history).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    let numbers = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_number"].as_str().unwrap())
        .collect::<Vec<&str>>();
    assert_eq!(numbers, ["KD20260820-1001", "KD20260818-4242"]);
}

#[actix_web::test]
async fn payment_standing_reflects_the_latest_ledger_row() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/1/payment", configure_settled_payment).await;
    assert_eq!(status, StatusCode::OK);
    let standing: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(standing["kind"], "gateway");
    assert_eq!(standing["status"], "COMPLETE");
    assert_eq!(standing["ref_id"], "0007KX9");
    assert_eq!(standing["transaction_id"], "1-1717171717171");
}

fn configure_order_lookup(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(anita_order())));
    db.expect_fetch_latest_transaction_for_order().returning(|_| Ok(None));
    let api = TrackingApi::new(db);
    cfg.service(OrderByNumberRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn configure_missing_order(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(None));
    let api = TrackingApi::new(db);
    cfg.service(OrderByNumberRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn configure_history(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_orders_for_customer().returning(|_| Ok(vec![anita_order(), older_order()]));
    let api = TrackingApi::new(db);
    cfg.service(OrdersForCustomerRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn configure_settled_payment(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(anita_order())));
    db.expect_fetch_latest_transaction_for_order().returning(|_| Ok(Some(complete_transaction())));
    let api = TrackingApi::new(db);
    cfg.service(OrderPaymentStatusRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn anita_order() -> Order {
    let placed = Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap();
    Order {
        id: 1,
        order_number: "KD20260820-1001".into(),
        customer_id: "cust-42".into(),
        customer_name: "Anita Gurung".into(),
        customer_email: "anita@example.com".into(),
        customer_phone: "9841000000".into(),
        delivery_address: "Thamel, Kathmandu".into(),
        items: Json(vec![
            OrderItem::new("sku-001", "Tokla Tea 500g", 340.into(), 1),
            OrderItem::new("sku-002", "Wai Wai (dozen)", 100.into(), 2),
        ]),
        subtotal: 540.into(),
        shipping_fee: 0.into(),
        tax: 0.into(),
        total: 540.into(),
        payment_method: PaymentMethod::Esewa,
        status: OrderStatusType::Pending,
        created_at: placed,
        updated_at: placed,
    }
}

fn older_order() -> Order {
    let placed = Utc.with_ymd_and_hms(2026, 8, 18, 15, 0, 0).unwrap();
    Order {
        id: 2,
        order_number: "KD20260818-4242".into(),
        payment_method: PaymentMethod::Cod,
        status: OrderStatusType::Delivered,
        created_at: placed,
        updated_at: placed,
        ..anita_order()
    }
}

fn complete_transaction() -> PaymentTransaction {
    let verified = Utc.with_ymd_and_hms(2026, 8, 20, 9, 45, 0).unwrap();
    PaymentTransaction {
        id: 7,
        transaction_id: TransactionId::new("1-1717171717171"),
        order_id: 1,
        amount: 540.into(),
        tax_amount: 0.into(),
        service_charge: 0.into(),
        delivery_charge: 0.into(),
        total_amount: 540.into(),
        status: TransactionStatus::Complete,
        gateway_ref_id: Some("0007KX9".into()),
        verified_at: Some(verified),
        created_at: verified,
        updated_at: verified,
    }
}
