mod api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod signing;

pub use api::{EsewaApi, StatusClient};
pub use config::EsewaConfig;
pub use data_objects::{CallbackClaim, PaymentFormData, StatusResponse};
pub use error::EsewaApiError;
pub use helpers::{esewa_amount, parse_esewa_amount};
pub use signing::{sign_payload, signature_message, verify_signature, SIGNED_FIELD_NAMES};
