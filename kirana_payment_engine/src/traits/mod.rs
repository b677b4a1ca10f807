//! The database contract the engine APIs are generic over.
//!
//! [`OrderManagement`] is the read-only half, used by tracking. [`PaymentGatewayDatabase`] adds the
//! writes and the verification unit of work. The SQLite backend implements both; test doubles mock
//! them.

mod order_management;
mod payment_gateway_database;

pub use order_management::{OrderApiError, OrderManagement};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
