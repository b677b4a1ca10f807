//! # The Kirana payment engine
//!
//! The payment engine is the beating heart of the storefront backend. It owns every piece of order and
//! payment state and is the only component that is allowed to mutate it.
//!
//! The engine is made up of
//!
//! * [`OrderFlowApi`], which drives the order lifecycle and applies verified gateway results to the
//!   transaction ledger,
//! * [`TrackingApi`], the read-only side used by customer-facing tracking endpoints,
//! * the [`traits`] module, which defines the database contract the APIs are generic over,
//! * an implementation of that contract for SQLite, [`SqliteDatabase`],
//! * and the [`events`] module, which broadcasts order activity to any subscribed handlers.
//!
//! Payment-gateway specifics (signatures, redirect payloads, status calls) deliberately live outside this
//! crate. The engine only ever sees amounts, transaction ids and already-verified statuses, so a second
//! gateway can be wired in without touching the state machines here.

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod kpe_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use kpe_api::{order_flow_api::OrderFlowApi, order_objects, payment_objects, tracking_api::TrackingApi};
#[cfg(feature = "sqlite")]
pub use sqlite::{create_database_if_missing, db_url, SqliteDatabase, MIGRATOR, SQLITE_DB_URL};
pub use traits::{OrderApiError, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError};
