//! Request signing for eSewa's ePay v2 protocol.
//!
//! Both sides compute an HMAC-SHA256 digest over an ordered `key=value` string and compare the base64 encodings.
//! The field order is part of the protocol: eSewa rebuilds the message from the fields named in
//! `signed_field_names`, in the order given, so the canonical message here must never be reordered.

use hmac::{Hmac, Mac};
use kpg_common::Secret;
use sha2::Sha256;

use crate::EsewaApiError;

/// The ordered list of fields covered by payment-request signatures.
pub const SIGNED_FIELD_NAMES: &str = "total_amount,transaction_uuid,product_code";

type HmacSha256 = Hmac<Sha256>;

/// Builds the canonical message for a payment-request signature.
///
/// `total_amount` must already be in wire form (a bare decimal string, e.g. `540`).
pub fn signature_message(total_amount: &str, transaction_uuid: &str, product_code: &str) -> String {
    format!("total_amount={total_amount},transaction_uuid={transaction_uuid},product_code={product_code}")
}

/// Signs `message` with the merchant secret and returns the standard base64 encoding of the raw digest.
///
/// An empty secret is a configuration error and fails immediately rather than producing a signature eSewa
/// would silently reject.
pub fn sign_payload(message: &str, secret_key: &Secret<String>) -> Result<String, EsewaApiError> {
    let key = secret_key.reveal();
    if key.is_empty() {
        return Err(EsewaApiError::MissingSecret);
    }
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| EsewaApiError::SigningError(e.to_string()))?;
    mac.update(message.as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(base64::encode(digest))
}

/// Recomputes the digest for `message` and compares it against a base64 signature in constant time.
pub fn verify_signature(
    message: &str,
    signature: &str,
    secret_key: &Secret<String>,
) -> Result<bool, EsewaApiError> {
    let key = secret_key.reveal();
    if key.is_empty() {
        return Err(EsewaApiError::MissingSecret);
    }
    let claimed = match base64::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| EsewaApiError::SigningError(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac.verify_slice(&claimed).is_ok())
}
