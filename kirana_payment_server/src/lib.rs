//! # Kirana payment server
//! This module hosts the REST server for the Kirana payment gateway. It is responsible for:
//! Accepting new storefront orders and handing them to the payment engine.
//! Building signed eSewa checkout forms for gateway orders.
//! Verifying eSewa callbacks against the status endpoint and reconciling the result into the ledger.
//! Serving order tracking and payment standing queries.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders`: Order creation and fulfilment updates.
//! * `/api/payments/esewa/*`: Checkout initiation, callback verification and refunds.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod esewa_routes;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
