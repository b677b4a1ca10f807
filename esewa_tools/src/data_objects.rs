use kpg_common::Rupees;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{helpers::parse_esewa_amount, EsewaApiError};

/// The complete, signed field set for eSewa's hosted payment form.
///
/// Every value is a string because that is what the form consumes; amounts are bare decimals (`"540"`).
/// The caller (typically the storefront) POSTs these fields to `payment_url`; this crate never performs
/// the redirect itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFormData {
    pub amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub transaction_uuid: String,
    pub product_code: String,
    pub product_service_charge: String,
    pub product_delivery_charge: String,
    pub success_url: String,
    pub failure_url: String,
    pub signed_field_names: String,
    pub signature: String,
    pub payment_url: String,
}

/// The decoded contents of the gateway's browser redirect.
///
/// Everything in here travelled through the customer's browser, so it is a *claim*, not a verified fact.
/// The only legitimate uses are looking up the local transaction record and feeding the authoritative
/// status query. In particular `status` must never be believed on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackClaim {
    pub transaction_uuid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_amount: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub signed_field_names: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl CallbackClaim {
    /// Decodes the base64 `data` query parameter of a redirect callback into a claim.
    pub fn decode(data: &str) -> Result<Self, EsewaApiError> {
        let raw = base64::decode(data.trim()).map_err(|e| EsewaApiError::MalformedCallback(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| EsewaApiError::MalformedCallback(e.to_string()))
    }

    /// The total amount the redirect claims was paid, in whole rupees.
    pub fn claimed_total(&self) -> Result<Rupees, EsewaApiError> {
        parse_esewa_amount(&self.total_amount)
    }
}

/// The authoritative answer from eSewa's server-to-server status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub transaction_uuid: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub total_amount: Option<String>,
}

// eSewa is not consistent about whether amounts are JSON numbers or strings, so both are accepted.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    string_or_number(de).map(Some)
}
