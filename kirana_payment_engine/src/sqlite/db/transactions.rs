use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentTransaction, PaymentTransaction, TransactionId, TransactionStatus},
    traits::PaymentGatewayError,
};

pub async fn insert_transaction(
    txn: &NewPaymentTransaction,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransaction, PaymentGatewayError> {
    let inserted = sqlx::query_as::<_, PaymentTransaction>(
        r#"INSERT INTO payment_transactions (
            transaction_id, order_id, amount, tax_amount, service_charge, delivery_charge, total_amount
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(&txn.transaction_id)
    .bind(txn.order_id)
    .bind(txn.amount)
    .bind(txn.tax_amount)
    .bind(txn.service_charge)
    .bind(txn.delivery_charge)
    .bind(txn.total_amount)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if e.as_database_error().map(|de| de.is_unique_violation()).unwrap_or(false) {
            return PaymentGatewayError::TransactionAlreadyExists(txn.transaction_id.clone());
        }
        debug!("📝️ Could not insert transaction {}. {e}", txn.transaction_id);
        PaymentGatewayError::from(e)
    })?;
    Ok(inserted)
}

pub async fn fetch_transaction(
    transaction_id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as(r#"SELECT * FROM payment_transactions WHERE transaction_id = $1"#)
        .bind(transaction_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_latest_transaction_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT * FROM payment_transactions WHERE order_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// Writes a new ledger status without consulting the state machine; that is the calling unit of
/// work's job. `ref_id` only ever overwrites an empty `gateway_ref_id`, and `stamp_verified` sets
/// `verified_at` if it has not been set before.
pub async fn update_transaction_status(
    transaction_id: &TransactionId,
    status: TransactionStatus,
    ref_id: Option<&str>,
    stamp_verified: bool,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransaction, PaymentGatewayError> {
    sqlx::query_as::<_, PaymentTransaction>(
        r#"UPDATE payment_transactions SET
            status = $1,
            gateway_ref_id = COALESCE(gateway_ref_id, $2),
            verified_at = CASE WHEN $3 AND verified_at IS NULL THEN CURRENT_TIMESTAMP ELSE verified_at END,
            updated_at = CURRENT_TIMESTAMP
        WHERE transaction_id = $4
        RETURNING *"#,
    )
    .bind(status)
    .bind(ref_id)
    .bind(stamp_verified)
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| PaymentGatewayError::TransactionNotFound(transaction_id.clone()))
}
