//! # Payment engine public API
//!
//! The engine exposes two API surfaces:
//!
//! * [`order_flow_api`] drives every mutation: order creation, payment initiation, verification,
//!   refunds and status updates. It also publishes order events.
//! * [`tracking_api`] is the read-only surface behind the customer tracking endpoints.
//!
//! Both are generic over the backend traits, so a server can run them against [`crate::SqliteDatabase`]
//! while tests run them against mocks:
//!
//! ```rust,ignore
//! use kirana_payment_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/kirana.db", 25).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.process_new_order(new_order).await?;
//! ```

pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod tracking_api;
