use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use esewa_tools::{EsewaApi, EsewaConfig, StatusResponse};
use kirana_payment_engine::{
    db_types::{
        Json,
        NewPaymentTransaction,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentMethod,
        PaymentTransaction,
        TransactionId,
        TransactionStatus,
    },
    events::EventProducers,
    order_objects::OrderChanged,
    payment_objects::{VerifyAnomaly, VerifyOutcome},
    traits::PaymentGatewayError,
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request},
    mocks::{MockGatewayStatus, MockPaymentsDb},
};
use crate::esewa_routes::{InitiatePaymentRoute, RecordRefundRoute, VerifyPaymentRoute};

// base64 of {"transaction_uuid":"1-1717171717171","total_amount":540,"status":"COMPLETE"}
const DATA_HAPPY: &str =
    "eyJ0cmFuc2FjdGlvbl91dWlkIjoiMS0xNzE3MTcxNzE3MTcxIiwidG90YWxfYW1vdW50Ijo1NDAsInN0YXR1cyI6IkNPTVBMRVRFIn0=";
// The same redirect, but the browser claims 999 rupees were paid.
const DATA_MISMATCH: &str =
    "eyJ0cmFuc2FjdGlvbl91dWlkIjoiMS0xNzE3MTcxNzE3MTcxIiwidG90YWxfYW1vdW50Ijo5OTksInN0YXR1cyI6IkNPTVBMRVRFIn0=";

#[actix_web::test]
async fn initiate_returns_a_signed_gateway_form() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"order_id": 1, "amount": 540});
    let (status, body) = post_request("/payments/esewa/initiate", &payload, configure_initiate_ok).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    assert_eq!(res["ledger_recorded"], true);
    assert_eq!(res["form"]["product_code"], "EPAYTEST");
    assert_eq!(res["form"]["total_amount"], "540");
    assert_eq!(res["form"]["signed_field_names"], "total_amount,transaction_uuid,product_code");
    assert!(res["form"]["transaction_uuid"].as_str().unwrap().starts_with("1-"));
    assert!(!res["form"]["signature"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn a_cash_order_cannot_open_a_gateway_payment() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"order_id": 1, "amount": 540});
    let (status, body) = post_request("/payments/esewa/initiate", &payload, configure_initiate_cod).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("cannot take a gateway payment"), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_ledger_outage_does_not_block_the_checkout() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"order_id": 1, "amount": 540});
    let (status, body) = post_request("/payments/esewa/initiate", &payload, configure_initiate_down).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    assert_eq!(res["ledger_recorded"], false);
    assert!(!res["form"]["signature"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn verify_confirms_the_payment_and_the_order() {
    let _ = env_logger::try_init().ok();
    let uri = format!("/payments/esewa/verify?data={DATA_HAPPY}");
    let (status, body) = get_request(&uri, configure_verify_ok).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    assert_eq!(res["status"], "COMPLETE");
    assert_eq!(res["ref_id"], "0007KX9");
    assert_eq!(res["order_status"], "confirmed");
    assert!(res.get("message").is_none());
}

#[actix_web::test]
async fn a_mismatched_claim_parks_the_payment() {
    let _ = env_logger::try_init().ok();
    let uri = format!("/payments/esewa/verify?data={DATA_MISMATCH}");
    let (status, body) = get_request(&uri, configure_verify_mismatch).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], false);
    assert_eq!(res["status"], "AMBIGUOUS");
    assert!(res["message"].as_str().unwrap().contains("does not match the ledger"), "unexpected body: {body}");
}

#[actix_web::test]
async fn an_undecodable_callback_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payments/esewa/verify?data=not-valid-base64", configure_verify_unreached).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("could not be understood"), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_gateway_outage_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let uri = format!("/payments/esewa/verify?data={DATA_HAPPY}");
    let (status, body) = get_request(&uri, configure_verify_gateway_down).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("unreachable"), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_verdict_without_a_ledger_row_is_reported_as_is() {
    let _ = env_logger::try_init().ok();
    let uri = format!("/payments/esewa/verify?data={DATA_HAPPY}");
    let (status, body) = get_request(&uri, configure_verify_unknown_row).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    assert_eq!(res["status"], "COMPLETE");
    assert_eq!(res["ref_id"], "0007KX9");
    assert!(res["message"].as_str().unwrap().contains("not in the ledger"), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_reported_refund_lands_in_the_ledger() {
    let _ = env_logger::try_init().ok();
    let payload = json!({"transaction_id": "1-1717171717171", "kind": "full"});
    let (status, body) = post_request("/payments/esewa/refund", &payload, configure_refund).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"FULL_REFUND\""), "unexpected body: {body}");
}

fn configure_initiate_ok(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    db.expect_insert_transaction().returning(|new| Ok(inserted(new)));
    add_initiate(cfg, db);
}

fn configure_initiate_cod(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_id().returning(|_| {
        let order = Order { payment_method: PaymentMethod::Cod, ..pending_order() };
        Ok(Some(order))
    });
    add_initiate(cfg, db);
}

fn configure_initiate_down(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(Some(pending_order())));
    db.expect_insert_transaction()
        .returning(|_| Err(PaymentGatewayError::DatabaseError("the ledger is on fire".into())));
    add_initiate(cfg, db);
}

fn configure_verify_ok(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_record_verified_status().returning(|_, _, _| {
        let outcome = VerifyOutcome {
            transaction: complete_transaction(),
            order_update: Some(OrderChanged::new(OrderStatusType::Pending, confirmed_order())),
            first_completion: true,
            anomaly: None,
        };
        Ok(outcome)
    });
    add_verify(cfg, db, complete_report());
}

fn configure_verify_mismatch(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_record_verified_status().returning(|_, _, _| {
        let parked = PaymentTransaction { status: TransactionStatus::Ambiguous, ..complete_transaction() };
        let anomaly = VerifyAnomaly::AmountMismatch { claimed: 999.into(), stored: 540.into() };
        Ok(VerifyOutcome::settled(parked).with_anomaly(anomaly))
    });
    add_verify(cfg, db, complete_report());
}

fn configure_verify_unreached(cfg: &mut ServiceConfig) {
    add_verify(cfg, MockPaymentsDb::new(), complete_report());
}

fn configure_verify_gateway_down(cfg: &mut ServiceConfig) {
    let db = MockPaymentsDb::new();
    let mut gateway = MockGatewayStatus::new();
    gateway.expect_fetch_transaction_status().returning(|_, _| Err(esewa_tools::EsewaApiError::Timeout));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(VerifyPaymentRoute::<MockPaymentsDb, MockGatewayStatus>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

fn configure_verify_unknown_row(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_record_verified_status()
        .returning(|id, _, _| Err(PaymentGatewayError::TransactionNotFound(id.clone())));
    add_verify(cfg, db, complete_report());
}

fn configure_refund(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_record_refund().returning(|_, kind| {
        let txn = PaymentTransaction { status: kind.as_status(), ..complete_transaction() };
        Ok(txn)
    });
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(RecordRefundRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

fn add_initiate(cfg: &mut ServiceConfig, db: MockPaymentsDb) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    let esewa = EsewaApi::new(EsewaConfig::sandbox()).unwrap();
    cfg.service(InitiatePaymentRoute::<MockPaymentsDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(esewa));
}

fn add_verify(cfg: &mut ServiceConfig, db: MockPaymentsDb, report: StatusResponse) {
    let mut gateway = MockGatewayStatus::new();
    gateway.expect_fetch_transaction_status().returning(move |_, _| Ok(report.clone()));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(VerifyPaymentRoute::<MockPaymentsDb, MockGatewayStatus>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway));
}

fn complete_report() -> StatusResponse {
    StatusResponse {
        status: "COMPLETE".into(),
        ref_id: Some("0007KX9".into()),
        product_code: Some("EPAYTEST".into()),
        transaction_uuid: Some("1-1717171717171".into()),
        total_amount: Some("540".into()),
    }
}

fn pending_order() -> Order {
    let placed = Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap();
    Order {
        id: 1,
        order_number: "KD20260820-1001".into(),
        customer_id: "cust-42".into(),
        customer_name: "Anita Gurung".into(),
        customer_email: "anita@example.com".into(),
        customer_phone: "9841000000".into(),
        delivery_address: "Thamel, Kathmandu".into(),
        items: Json(vec![OrderItem::new("sku-001", "Tokla Tea 500g", 540.into(), 1)]),
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

fn confirmed_order() -> Order {
    Order { status: OrderStatusType::Confirmed, ..pending_order() }
}

// Mock response to `insert_transaction`: the `INITIATED` row as stored.
fn inserted(new: NewPaymentTransaction) -> PaymentTransaction {
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 9, 31, 0).unwrap();
    PaymentTransaction {
        id: 7,
        transaction_id: new.transaction_id,
        order_id: new.order_id,
        amount: new.amount,
        tax_amount: new.tax_amount,
        service_charge: new.service_charge,
        delivery_charge: new.delivery_charge,
        total_amount: new.total_amount,
        status: TransactionStatus::Initiated,
        gateway_ref_id: None,
        verified_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn complete_transaction() -> PaymentTransaction {
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 9, 45, 0).unwrap();
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
        verified_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}
