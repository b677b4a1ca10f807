use kpg_common::Secret;
use log::*;

pub const ESEWA_SANDBOX_PAYMENT_URL: &str = "https://rc-epay.esewa.com.np/api/epay/main/v2/form";
pub const ESEWA_SANDBOX_STATUS_URL: &str = "https://rc.esewa.com.np/api/epay/transaction/status/";
pub const ESEWA_SANDBOX_PRODUCT_CODE: &str = "EPAYTEST";
pub const ESEWA_SANDBOX_SECRET_KEY: &str = "8gBm/:&EnhH.1/q";
pub const ESEWA_PRODUCTION_PAYMENT_URL: &str = "https://epay.esewa.com.np/api/epay/main/v2/form";
pub const ESEWA_PRODUCTION_STATUS_URL: &str = "https://epay.esewa.com.np/api/epay/transaction/status/";

/// Immutable gateway configuration, built once at startup and injected into the signing and verification paths.
///
/// The sandbox profile carries eSewa's published test credentials, so a development instance works with no
/// environment at all. Production deployments must supply `KPG_ESEWA_PRODUCT_CODE` and `KPG_ESEWA_SECRET_KEY`.
#[derive(Debug, Clone)]
pub struct EsewaConfig {
    pub payment_url: String,
    pub status_url: String,
    pub product_code: String,
    pub secret_key: Secret<String>,
    /// Where the gateway sends the customer's browser after a successful payment.
    pub success_url: String,
    /// Where the gateway sends the customer's browser after a failed or abandoned payment.
    pub failure_url: String,
}

impl Default for EsewaConfig {
    fn default() -> Self {
        Self::sandbox()
    }
}

impl EsewaConfig {
    pub fn sandbox() -> Self {
        Self {
            payment_url: ESEWA_SANDBOX_PAYMENT_URL.to_string(),
            status_url: ESEWA_SANDBOX_STATUS_URL.to_string(),
            product_code: ESEWA_SANDBOX_PRODUCT_CODE.to_string(),
            secret_key: Secret::new(ESEWA_SANDBOX_SECRET_KEY.to_string()),
            success_url: "http://localhost:5173/esewa-callback".to_string(),
            failure_url: "http://localhost:5173/checkout?payment=failed".to_string(),
        }
    }

    pub fn production(product_code: String, secret_key: Secret<String>) -> Self {
        Self {
            payment_url: ESEWA_PRODUCTION_PAYMENT_URL.to_string(),
            status_url: ESEWA_PRODUCTION_STATUS_URL.to_string(),
            product_code,
            secret_key,
            success_url: String::default(),
            failure_url: String::default(),
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let profile = std::env::var("KPG_ESEWA_ENV").unwrap_or_else(|_| "sandbox".to_string());
        let mut config = match profile.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "live" => {
                let product_code = std::env::var("KPG_ESEWA_PRODUCT_CODE").unwrap_or_else(|_| {
                    error!("KPG_ESEWA_PRODUCT_CODE is not set. eSewa will reject every payment request.");
                    String::default()
                });
                let secret_key = Secret::new(std::env::var("KPG_ESEWA_SECRET_KEY").unwrap_or_else(|_| {
                    error!("KPG_ESEWA_SECRET_KEY is not set. Signing will fail until it is provided.");
                    String::default()
                }));
                Self::production(product_code, secret_key)
            },
            "sandbox" | "test" => Self::sandbox(),
            other => {
                warn!("Unknown KPG_ESEWA_ENV value '{other}'. Falling back to the sandbox profile.");
                Self::sandbox()
            },
        };
        if let Ok(url) = std::env::var("KPG_ESEWA_PAYMENT_URL") {
            config.payment_url = url;
        }
        if let Ok(url) = std::env::var("KPG_ESEWA_STATUS_URL") {
            config.status_url = url;
        }
        if let Ok(code) = std::env::var("KPG_ESEWA_PRODUCT_CODE") {
            config.product_code = code;
        }
        if let Ok(key) = std::env::var("KPG_ESEWA_SECRET_KEY") {
            config.secret_key = Secret::new(key);
        }
        match std::env::var("KPG_ESEWA_SUCCESS_URL") {
            Ok(url) => config.success_url = url,
            Err(_) => warn!("KPG_ESEWA_SUCCESS_URL not set. Using {} as the post-payment redirect.", config.success_url),
        }
        match std::env::var("KPG_ESEWA_FAILURE_URL") {
            Ok(url) => config.failure_url = url,
            Err(_) => warn!("KPG_ESEWA_FAILURE_URL not set. Using {} as the failure redirect.", config.failure_url),
        }
        config
    }
}
