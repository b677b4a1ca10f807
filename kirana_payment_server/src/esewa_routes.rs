//----------------------------------------------   Checkout  ----------------------------------------------------

use std::str::FromStr;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use esewa_tools::{esewa_amount, CallbackClaim, EsewaApi, StatusClient};
use kirana_payment_engine::{
    db_types::{NewPaymentTransaction, TransactionId, TransactionStatus},
    payment_objects::{VerifiedStatus, VerifyAnomaly, VerifyOutcome},
    traits::{OrderApiError, PaymentGatewayDatabase, PaymentGatewayError},
    OrderFlowApi,
};
use log::*;

use crate::{
    data_objects::{InitiatePaymentRequest, InitiateResponse, RefundRequest, VerifyQuery, VerifyResponse},
    errors::ServerError,
    route,
};

route!(initiate_payment => Post "/payments/esewa/initiate" impl PaymentGatewayDatabase);
/// Opens a payment attempt and returns the signed eSewa form for it.
///
/// The engine validates the order and writes the `INITIATED` ledger row. If only the ledger write
/// fails, the checkout must not be blocked on our bookkeeping: the form is signed and returned
/// anyway, flagged with `ledger_recorded: false`, and verification later answers from the gateway
/// report alone.
pub async fn initiate_payment<B: PaymentGatewayDatabase>(
    body: web::Json<InitiatePaymentRequest>,
    api: web::Data<OrderFlowApi<B>>,
    esewa: web::Data<EsewaApi>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST initiate eSewa payment for order {}", req.order_id);
    let (transaction_id, amounts, ledger_recorded) = match api.initiate_payment(req.order_id, req.amounts).await {
        Ok(txn) => (txn.transaction_id.clone(), txn.breakdown(), true),
        Err(PaymentGatewayError::DatabaseError(e))
        | Err(PaymentGatewayError::QueryError(OrderApiError::DatabaseError(e))) => {
            error!(
                "💻️🚨️ Could not record the payment attempt for order {}: {e}. The checkout goes ahead unrecorded.",
                req.order_id
            );
            let txn = NewPaymentTransaction::new(req.order_id, req.amounts, Utc::now());
            (txn.transaction_id, req.amounts, false)
        },
        Err(e) => return Err(e.into()),
    };
    let form = esewa.payment_form(
        transaction_id.as_str(),
        amounts.amount,
        amounts.tax_amount,
        amounts.service_charge,
        amounts.delivery_charge,
    )?;
    info!("💻️💳️ Payment attempt {transaction_id} for order {} handed to eSewa.", req.order_id);
    let response =
        InitiateResponse { success: true, transaction_id: transaction_id.to_string(), ledger_recorded, form };
    Ok(HttpResponse::Ok().json(response))
}

route!(verify_payment => Get "/payments/esewa/verify" impl PaymentGatewayDatabase, StatusClient);
/// Settles an eSewa redirect callback against the gateway's status endpoint.
///
/// The redirect payload is treated as a claim and never as a verdict. The handler decodes it, asks
/// the status endpoint what actually happened, and records that answer in the ledger. Anything the
/// reconciliation found odd comes back in the `message` field with a 200; only transport failures
/// and undecodable callbacks map to error responses.
pub async fn verify_payment<B, S>(
    query: web::Query<VerifyQuery>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<S>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    S: StatusClient,
{
    trace!("💻️ Received eSewa verification callback");
    let claim = CallbackClaim::decode(&query.data).map_err(|e| {
        warn!("💻️💳️ Could not decode the callback payload. {e}");
        ServerError::from(e)
    })?;
    let transaction_id = TransactionId::new(claim.transaction_uuid.clone());
    let claimed_total = claim.claimed_total()?;
    debug!(
        "💻️💳️ Callback for {transaction_id} claims {claimed_total} and status {}",
        claim.status.as_deref().unwrap_or("n/a")
    );
    let report = gateway.fetch_transaction_status(transaction_id.as_str(), &esewa_amount(claimed_total)).await?;
    let verdict = TransactionStatus::from_str(&report.status).map_err(|e| {
        warn!("💻️💳️ eSewa reported an unknown status '{}' for {transaction_id}.", report.status);
        ServerError::MalformedGatewayResponse(e.to_string())
    })?;
    let verified = VerifiedStatus::new(verdict, report.ref_id.clone());
    match api.record_verification(&transaction_id, claimed_total, verified).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(verify_response_from(&transaction_id, &outcome))),
        Err(PaymentGatewayError::TransactionNotFound(_)) => {
            error!(
                "💻️🚨️ eSewa answered for {transaction_id}, but the ledger has no such row. Reporting the gateway \
                 verdict as-is; this transaction needs manual reconciliation."
            );
            let response = VerifyResponse {
                success: verdict == TransactionStatus::Complete,
                transaction_id: transaction_id.to_string(),
                status: verdict,
                ref_id: report.ref_id,
                order_status: None,
                message: Some("The transaction is not in the ledger. This result comes from the gateway alone.".into()),
            };
            Ok(HttpResponse::Ok().json(response))
        },
        Err(e) => Err(e.into()),
    }
}

fn verify_response_from(transaction_id: &TransactionId, outcome: &VerifyOutcome) -> VerifyResponse {
    let message = outcome.anomaly.as_ref().map(|anomaly| match anomaly {
        VerifyAnomaly::AmountMismatch { claimed, stored } => format!(
            "The claimed total ({claimed}) does not match the ledger ({stored}). The payment is parked for review."
        ),
        VerifyAnomaly::OrderNotTransitioned { order_status } => {
            format!("The payment is complete, but the order is {order_status} and was left alone.")
        },
        VerifyAnomaly::TransitionRefused { from, to } => {
            format!("The gateway reported {to}, but the ledger holds {from} and keeps it.")
        },
    });
    VerifyResponse {
        success: outcome.is_paid(),
        transaction_id: transaction_id.to_string(),
        status: outcome.transaction.status,
        ref_id: outcome.transaction.gateway_ref_id.clone(),
        order_status: outcome.order_update.as_ref().map(|change| change.new_status()),
        message,
    }
}

route!(record_refund => Post "/payments/esewa/refund" impl PaymentGatewayDatabase);
/// Records a refund that eSewa has reported against a completed payment.
pub async fn record_refund<B: PaymentGatewayDatabase>(
    body: web::Json<RefundRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let transaction_id = TransactionId::new(req.transaction_id);
    debug!("💻️ POST {:?} refund against {transaction_id}", req.kind);
    let txn = api.record_refund(&transaction_id, req.kind).await?;
    Ok(HttpResponse::Ok().json(txn))
}
