use log::*;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::PaymentGatewayError,
};

pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let inserted = sqlx::query_as::<_, Order>(
        r#"INSERT INTO orders (
            order_number, customer_id, customer_name, customer_email, customer_phone, delivery_address,
            items, subtotal, shipping_fee, tax, total, payment_method
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *"#,
    )
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.delivery_address)
    .bind(Json(&order.items))
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.tax)
    .bind(order.total)
    .bind(order.payment_method)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if e.as_database_error().map(|de| de.is_unique_violation()).unwrap_or(false) {
            return PaymentGatewayError::OrderNumberAlreadyExists(order.order_number.clone());
        }
        debug!("📝️ Could not insert order {}. {e}", order.order_number);
        PaymentGatewayError::from(e)
    })?;
    Ok(inserted)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(r#"SELECT * FROM orders WHERE id = $1"#).bind(id).fetch_optional(conn).await
}

/// The `order_number` column carries `COLLATE NOCASE`, so this match is case-insensitive.
pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(r#"SELECT * FROM orders WHERE order_number = $1"#).bind(number).fetch_optional(conn).await
}

pub async fn fetch_orders_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(r#"SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"#)
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

/// Writes the new status unconditionally. State machine checks happen in the calling unit of work.
pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    sqlx::query_as::<_, Order>(
        r#"UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *"#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(PaymentGatewayError::OrderIdNotFound(id))
}
